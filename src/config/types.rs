//! Configuration types and structures.

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::host::Capabilities;
use crate::nfc::DEFAULT_NFC_COMMENT;
use crate::values::ComponentName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub nfc: NfcConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

impl Config {
    /// Load a single configuration file, without tier merging.
    pub fn load(path: &Path) -> ProvisioningResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ProvisioningError::io(path, e))?;
        serde_yaml::from_str(&content).map_err(|source| ProvisioningError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_api_level(self.platform.api_level)
    }
}

/// Where provisioning files are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the provisioning files (default: current directory).
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Flat `key=value` file name.
    #[serde(default = "default_text_file")]
    pub text_file: String,

    /// JSON file name, preferred over the flat file.
    #[serde(default = "default_json_file")]
    pub json_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            text_file: default_text_file(),
            json_file: default_json_file(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_text_file() -> String {
    crate::loader::DEFAULT_TEXT_FILE.to_string()
}

fn default_json_file() -> String {
    crate::loader::DEFAULT_JSON_FILE.to_string()
}

/// Device admin filled in when the provisioning files name none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_admin_package")]
    pub admin_package: String,

    /// Short-flattened component, `package/.Class`.
    #[serde(default = "default_admin_component")]
    pub admin_component: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            admin_package: default_admin_package(),
            admin_component: default_admin_component(),
        }
    }
}

fn default_admin_package() -> String {
    "com.example.android.deviceowner".to_string()
}

fn default_admin_component() -> String {
    "com.example.android.deviceowner/.DeviceOwnerReceiver".to_string()
}

/// Target platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// API level of the device being provisioned (default: 23).
    #[serde(default = "default_api_level")]
    pub api_level: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
        }
    }
}

fn default_api_level() -> u32 {
    crate::host::ADMIN_COMPONENT_API_LEVEL
}

/// NFC payload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NfcConfig {
    /// Header comment written at the top of the payload body.
    #[serde(default = "default_nfc_comment")]
    pub comment: String,
}

impl Default for NfcConfig {
    fn default() -> Self {
        Self {
            comment: default_nfc_comment(),
        }
    }
}

fn default_nfc_comment() -> String {
    DEFAULT_NFC_COMMENT.to_string()
}

/// Managed-profile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Name given to the managed profile once created.
    #[serde(default = "default_profile_name")]
    pub name: String,

    /// Directory for post-provisioning state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Package of the profile-owner app.
    #[serde(default = "default_profile_package")]
    pub admin_package: String,

    /// Device admin receiver class of the profile-owner app.
    #[serde(default = "default_profile_receiver")]
    pub admin_receiver: String,
}

impl ProfileConfig {
    pub fn admin(&self) -> ComponentName {
        ComponentName::new(&self.admin_package, &self.admin_receiver)
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            state_dir: default_state_dir(),
            admin_package: default_profile_package(),
            admin_receiver: default_profile_receiver(),
        }
    }
}

fn default_profile_name() -> String {
    "Sample Managed Profile".to_string()
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("nfc-provisioning"))
        .unwrap_or_else(|| PathBuf::from(".nfc-provisioning"))
}

fn default_profile_package() -> String {
    "com.example.android.basicmanagedprofile".to_string()
}

fn default_profile_receiver() -> String {
    "com.example.android.basicmanagedprofile.BasicDeviceAdminReceiver".to_string()
}
