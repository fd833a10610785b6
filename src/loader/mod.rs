//! Provisioning value loading.
//!
//! A load resolves values in layers:
//! 1. **JSON file** (`nfcprovisioning.json`) - preferred source
//! 2. **Flat file** (`nfcprovisioning.txt`) - read only if the JSON pass
//!    produced nothing; unrecognized keys are folded into the extras bundle
//! 3. **System values** - fill whatever is still missing
//!
//! Read and parse failures are logged and never abort the load. Whether a
//! file was read is recorded under [`keys::LOADED_FILENAME`].

pub mod defaults;
pub mod extras;
pub mod flat;
pub mod json;

pub use defaults::{AdminDefaults, fill_system_values, trim_ssid};
pub use extras::{decode_admin_extras, gather_admin_extras};

use crate::config::Config;
use crate::error::{ProvisioningError, ProvisioningResult};
use crate::host::{Capabilities, HostEnvironment};
use crate::keys;
use crate::values::ProvisioningValues;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

pub const DEFAULT_TEXT_FILE: &str = "nfcprovisioning.txt";
pub const DEFAULT_JSON_FILE: &str = "nfcprovisioning.json";

/// Where to look for provisioning files and how to fill gaps.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub storage_dir: PathBuf,
    pub text_file: String,
    pub json_file: String,
    pub admin: AdminDefaults,
    pub capabilities: Capabilities,
}

impl LoaderSettings {
    /// Settings with default file names and admin in `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            text_file: DEFAULT_TEXT_FILE.to_string(),
            json_file: DEFAULT_JSON_FILE.to_string(),
            admin: AdminDefaults::default(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_dir: config.storage.dir.clone(),
            text_file: config.storage.text_file.clone(),
            json_file: config.storage.json_file.clone(),
            admin: AdminDefaults {
                package_name: config.defaults.admin_package.clone(),
                component_name: config.defaults.admin_component.clone(),
            },
            capabilities: config.capabilities(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn text_path(&self) -> PathBuf {
        self.storage_dir.join(&self.text_file)
    }

    pub fn json_path(&self) -> PathBuf {
        self.storage_dir.join(&self.json_file)
    }
}

fn record_loaded_file(values: &mut ProvisioningValues, path: &Path) {
    values.insert(keys::LOADED_FILENAME, path.to_string_lossy().to_string());
}

fn load_json_from_disk(path: &Path, values: &mut ProvisioningValues) {
    if !path.exists() {
        return;
    }
    match json::load_json_file(path, values) {
        Ok(()) => record_loaded_file(values, path),
        Err(e) => debug!(path = %path.display(), error = %e, "Unable to load JSON provisioning file"),
    }
}

fn load_flat_from_disk(path: &Path, values: &mut ProvisioningValues) {
    if !path.exists() {
        return;
    }
    debug!(path = %path.display(), "Loading the config file");
    match flat::load_flat_file(path, values) {
        Ok(()) => record_loaded_file(values, path),
        Err(e) => error!(path = %path.display(), error = %e, "Error loading provisioning file"),
    }
}

/// Resolve provisioning values once, synchronously.
pub fn load_values(settings: &LoaderSettings, host: &dyn HostEnvironment) -> ProvisioningValues {
    let mut values = ProvisioningValues::new();
    load_json_from_disk(&settings.json_path(), &mut values);
    if values.is_empty() {
        load_flat_from_disk(&settings.text_path(), &mut values);
    }
    fill_system_values(&mut values, &settings.admin, host, settings.capabilities);
    match values.loaded_file() {
        Some(file) => info!(file, count = values.len(), "Provisioning values loaded"),
        None => info!(
            dir = %settings.storage_dir.display(),
            "No provisioning file read, using system defaults"
        ),
    }
    values
}

#[derive(Debug, Default)]
struct LoaderState {
    cached: Option<ProvisioningValues>,
    generation: u64,
    content_changed: bool,
}

/// Loads provisioning values off the calling task and caches the result.
///
/// At most one load runs at a time; a caller arriving while one is in flight
/// waits for it and receives its result. A load that is still running when
/// [`ValuesLoader::reset`] is called is discarded instead of delivered.
pub struct ValuesLoader {
    settings: Arc<LoaderSettings>,
    host: Arc<dyn HostEnvironment + Send + Sync>,
    state: Mutex<LoaderState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl ValuesLoader {
    pub fn new(settings: LoaderSettings, host: Arc<dyn HostEnvironment + Send + Sync>) -> Self {
        Self {
            settings: Arc::new(settings),
            host,
            state: Mutex::new(LoaderState::default()),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    fn state(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolve values on the current thread without touching the cache.
    pub fn load_in_background(&self) -> ProvisioningValues {
        load_values(&self.settings, self.host.as_ref())
    }

    /// Deliver the cached values, or load them on a blocking thread.
    ///
    /// Returns `Ok(None)` when the loader was reset while loading.
    pub async fn start_loading(&self) -> ProvisioningResult<Option<ProvisioningValues>> {
        let _loading = self.in_flight.lock().await;
        let generation = {
            let mut state = self.state();
            if let Some(cached) = &state.cached
                && !state.content_changed
            {
                return Ok(Some(cached.clone()));
            }
            state.content_changed = false;
            state.generation
        };

        let settings = Arc::clone(&self.settings);
        let host = Arc::clone(&self.host);
        let values = tokio::task::spawn_blocking(move || load_values(&settings, host.as_ref()))
            .await
            .map_err(|e| ProvisioningError::Background(e.to_string()))?;

        Ok(self.deliver_result(generation, values))
    }

    fn deliver_result(
        &self,
        generation: u64,
        values: ProvisioningValues,
    ) -> Option<ProvisioningValues> {
        let mut state = self.state();
        if state.generation != generation {
            debug!("Loader was reset, dropping loaded values");
            return None;
        }
        state.cached = Some(values.clone());
        Some(values)
    }

    /// Drop cached values and discard any load in flight.
    pub fn reset(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.cached = None;
        state.content_changed = false;
    }

    /// Force the next [`ValuesLoader::start_loading`] to reload.
    pub fn on_content_changed(&self) {
        self.state().content_changed = true;
    }

    /// Values from the last delivered load.
    pub fn cached(&self) -> Option<ProvisioningValues> {
        self.state().cached.clone()
    }
}
