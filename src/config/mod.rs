//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/nfc-provisioning/config.yaml`
//! 3. **User** - `~/.nfc-provisioning/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `NFC_PROVISIONING_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `NFC_PROVISIONING_STORAGE_DIR` - Directory holding the provisioning files
//! - `NFC_PROVISIONING_STATE_DIR` - Managed-profile state directory
//! - `NFC_PROVISIONING_USER_DIR` - User config dir (default: `~/.nfc-provisioning`)
//! - `NFC_PROVISIONING_PROJECT_DIR` - Project config dir (default: `./nfc-provisioning`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::deep_merge;
pub use types::*;
