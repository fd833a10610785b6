//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use crate::error::{ProvisioningError, ProvisioningResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// Explicit file that replaces the project and user tiers.
    pub explicit_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("NFC_PROVISIONING_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".nfc-provisioning")));

        let project_dir = std::env::var("NFC_PROVISIONING_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("nfc-provisioning")));

        let explicit_file = std::env::var("NFC_PROVISIONING_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        Self {
            project_dir,
            user_dir,
            explicit_file,
        }
    }

    /// Create paths with explicit directories and no explicit file.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    /// Use `file` instead of the project and user tiers.
    pub fn with_explicit_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(file.into());
        self
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority config file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> ProvisioningResult<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> ProvisioningResult<Self> {
        let mut config_path = None;

        let mut config = if let Some(explicit) = &paths.explicit_file {
            // An explicit file must be readable, unlike the optional tiers.
            config_path = Some(explicit.clone());
            Config::load(explicit)?
        } else {
            let mut tiers: Vec<Value> = Vec::new();
            let defaults = serde_json::to_value(Config::default()).map_err(|source| {
                ProvisioningError::Json {
                    path: PathBuf::from("<defaults>"),
                    source,
                }
            })?;
            debug!(tier = %ConfigTier::Defaults, "Loaded config tier");
            tiers.push(defaults);

            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                let Some(dir) = dir else { continue };
                let file = dir.join(CONFIG_FILE);
                if let Some(value) = read_tier(&file, tier) {
                    tiers.push(value);
                    config_path = Some(file);
                }
            }

            let merged = deep_merge_all(tiers);
            serde_json::from_value(merged).map_err(|source| ProvisioningError::Json {
                path: config_path.clone().unwrap_or_else(|| PathBuf::from("<merged>")),
                source,
            })?
        };

        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) {
        let tier = ConfigTier::Environment;

        if let Ok(dir) = std::env::var("NFC_PROVISIONING_STORAGE_DIR") {
            debug!(%tier, var = "NFC_PROVISIONING_STORAGE_DIR", dir = %dir, "Config override");
            config.storage.dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("NFC_PROVISIONING_STATE_DIR") {
            debug!(%tier, var = "NFC_PROVISIONING_STATE_DIR", dir = %dir, "Config override");
            config.profile.state_dir = PathBuf::from(dir);
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Read one optional tier. Unreadable or invalid files are skipped with a
/// warning.
fn read_tier(file: &Path, tier: ConfigTier) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file.display(), %tier, error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(path = %file.display(), %tier, "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(path = %file.display(), %tier, error = %e, "Skipping invalid config file");
            None
        }
    }
}
