//! Provisioning extra names and related constants.
//!
//! These mirror the extras a provisioning intent or NFC payload carries on
//! the receiving device.

/// Prefix shared by every recognized provisioning key.
pub const RECOGNIZED_PREFIX: &str = "android.app.extra";

pub const DEVICE_ADMIN_PACKAGE_NAME: &str =
    "android.app.extra.PROVISIONING_DEVICE_ADMIN_PACKAGE_NAME";
pub const DEVICE_ADMIN_COMPONENT_NAME: &str =
    "android.app.extra.PROVISIONING_DEVICE_ADMIN_COMPONENT_NAME";
pub const LOCALE: &str = "android.app.extra.PROVISIONING_LOCALE";
pub const TIME_ZONE: &str = "android.app.extra.PROVISIONING_TIME_ZONE";
pub const LOCAL_TIME: &str = "android.app.extra.PROVISIONING_LOCAL_TIME";
pub const WIFI_SSID: &str = "android.app.extra.PROVISIONING_WIFI_SSID";
pub const WIFI_HIDDEN: &str = "android.app.extra.PROVISIONING_WIFI_HIDDEN";
pub const WIFI_SECURITY_TYPE: &str = "android.app.extra.PROVISIONING_WIFI_SECURITY_TYPE";
pub const WIFI_PASSWORD: &str = "android.app.extra.PROVISIONING_WIFI_PASSWORD";
pub const ADMIN_EXTRAS_BUNDLE: &str = "android.app.extra.PROVISIONING_ADMIN_EXTRAS_BUNDLE";

/// Sentinel key recording which file a load read its values from.
///
/// The leading space keeps it out of the recognized namespace and sorts it
/// ahead of every real key.
pub const LOADED_FILENAME: &str = " FileName";

/// MIME type of the NDEF record that carries an NFC provisioning payload.
pub const MIME_TYPE_PROVISIONING_NFC: &str = "application/com.android.managedprovisioning";

/// Action asking the platform to provision a managed profile.
pub const ACTION_PROVISION_MANAGED_PROFILE: &str =
    "android.app.action.PROVISION_MANAGED_PROFILE";

/// Whether `key` belongs to the recognized provisioning namespace.
pub fn is_recognized(key: &str) -> bool {
    key.starts_with(RECOGNIZED_PREFIX)
}
