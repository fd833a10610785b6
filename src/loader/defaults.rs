//! Filling of missing provisioning values from host state and fixed defaults.

use crate::host::{Capabilities, HostEnvironment};
use crate::keys;
use crate::values::ProvisioningValues;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Device admin used when the loaded values name none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDefaults {
    pub package_name: String,
    /// Short-flattened component, e.g. `com.example/.Receiver`.
    pub component_name: String,
}

impl Default for AdminDefaults {
    fn default() -> Self {
        Self {
            package_name: "com.example.android.deviceowner".to_string(),
            component_name: "com.example.android.deviceowner/.DeviceOwnerReceiver".to_string(),
        }
    }
}

/// Fill every absent default key. Present keys are never overwritten.
pub fn fill_system_values(
    values: &mut ProvisioningValues,
    admin: &AdminDefaults,
    host: &dyn HostEnvironment,
    caps: Capabilities,
) {
    values.insert_if_missing(keys::DEVICE_ADMIN_PACKAGE_NAME, admin.package_name.as_str());
    if caps.admin_component {
        values.insert_if_missing(keys::DEVICE_ADMIN_COMPONENT_NAME, admin.component_name.as_str());
    }
    if !values.contains_key(keys::LOCALE) {
        values.insert(keys::LOCALE, host.primary_locale());
    }
    if !values.contains_key(keys::TIME_ZONE) {
        values.insert(keys::TIME_ZONE, host.time_zone());
    }
    if !values.contains_key(keys::WIFI_SSID) {
        match host.wifi_connection() {
            Some(connection) => {
                values.insert(keys::WIFI_SSID, trim_ssid(&connection.ssid));
            }
            None => debug!("Not associated with a WiFi network, leaving SSID unset"),
        }
    }
}

/// Strip one leading and one trailing double quote, if present.
pub fn trim_ssid(ssid: &str) -> &str {
    let ssid = ssid.strip_prefix('"').unwrap_or(ssid);
    ssid.strip_suffix('"').unwrap_or(ssid)
}
