//! The resolved provisioning-value mapping and the edits applied to it.

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::host::Capabilities;
use crate::keys;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Provisioning parameters keyed by extra name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisioningValues {
    entries: BTreeMap<String, String>,
}

impl ProvisioningValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert only when `key` has no value yet. Returns whether it inserted.
    pub fn insert_if_missing(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keep only the entries for which `f` returns true.
    pub fn retain(&mut self, mut f: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|k, v| f(k, v));
    }

    /// Path of the file the values were read from, if any.
    pub fn loaded_file(&self) -> Option<&str> {
        self.get(keys::LOADED_FILENAME)
    }

    /// Apply an edit of one user-facing field.
    pub fn apply_edit(&mut self, field: Field, text: &str, caps: Capabilities) {
        match field {
            Field::ClassName => {
                if !caps.admin_component {
                    return;
                }
                if text.is_empty() {
                    self.remove(keys::DEVICE_ADMIN_COMPONENT_NAME);
                } else {
                    let package = self
                        .get(keys::DEVICE_ADMIN_PACKAGE_NAME)
                        .unwrap_or_default()
                        .to_string();
                    let name = ComponentName::new(package, text);
                    self.insert(keys::DEVICE_ADMIN_COMPONENT_NAME, name.flatten_to_short_string());
                }
            }
            other => {
                if let Some(key) = other.key() {
                    self.insert(key, text);
                }
            }
        }
    }

    /// Current text of every user-facing field.
    pub fn fields(&self, caps: Capabilities) -> Vec<(Field, String)> {
        Field::ALL
            .iter()
            .filter(|field| caps.admin_component || **field != Field::ClassName)
            .map(|&field| {
                let text = match field {
                    Field::ClassName => self
                        .get(keys::DEVICE_ADMIN_COMPONENT_NAME)
                        .and_then(ComponentName::unflatten_from_string)
                        .map(|name| name.class_name)
                        .unwrap_or_default(),
                    other => other
                        .key()
                        .and_then(|key| self.get(key))
                        .unwrap_or_default()
                        .to_string(),
                };
                (field, text)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProvisioningValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// User-editable provisioning fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PackageName,
    ClassName,
    Locale,
    Timezone,
    WifiSsid,
    WifiSecurityType,
    WifiHidden,
    WifiPassword,
    Extras,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::PackageName,
        Field::ClassName,
        Field::Locale,
        Field::Timezone,
        Field::WifiSsid,
        Field::WifiSecurityType,
        Field::WifiHidden,
        Field::WifiPassword,
        Field::Extras,
    ];

    /// Key the field writes directly. The class name has none: it is folded
    /// into the admin component together with the package name.
    pub fn key(self) -> Option<&'static str> {
        match self {
            Field::PackageName => Some(keys::DEVICE_ADMIN_PACKAGE_NAME),
            Field::ClassName => None,
            Field::Locale => Some(keys::LOCALE),
            Field::Timezone => Some(keys::TIME_ZONE),
            Field::WifiSsid => Some(keys::WIFI_SSID),
            Field::WifiSecurityType => Some(keys::WIFI_SECURITY_TYPE),
            Field::WifiHidden => Some(keys::WIFI_HIDDEN),
            Field::WifiPassword => Some(keys::WIFI_PASSWORD),
            Field::Extras => Some(keys::ADMIN_EXTRAS_BUNDLE),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::PackageName => "package_name",
            Field::ClassName => "class_name",
            Field::Locale => "locale",
            Field::Timezone => "timezone",
            Field::WifiSsid => "wifi_ssid",
            Field::WifiSecurityType => "wifi_security_type",
            Field::WifiHidden => "wifi_hidden",
            Field::WifiPassword => "wifi_password",
            Field::Extras => "extras",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ProvisioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| ProvisioningError::UnknownField(s.to_string()))
    }
}

/// Parse a `FIELD=VALUE` edit.
pub fn parse_edit(s: &str) -> ProvisioningResult<(Field, String)> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| ProvisioningError::InvalidEdit(s.to_string()))?;
    Ok((field.parse()?, value.to_string()))
}

/// An app component identified by package and class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentName {
    pub package_name: String,
    pub class_name: String,
}

impl ComponentName {
    pub fn new(package_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            class_name: class_name.into(),
        }
    }

    /// `package/class`, abbreviating the class to `.Suffix` when it lives
    /// under the package.
    pub fn flatten_to_short_string(&self) -> String {
        let class = self
            .class_name
            .strip_prefix(self.package_name.as_str())
            .filter(|rest| rest.starts_with('.'))
            .unwrap_or(&self.class_name);
        format!("{}/{}", self.package_name, class)
    }

    pub fn flatten_to_string(&self) -> String {
        format!("{}/{}", self.package_name, self.class_name)
    }

    /// Parse `package/class`, expanding a leading `.` in the class. The
    /// class part must not be empty.
    pub fn unflatten_from_string(s: &str) -> Option<Self> {
        let (package, class) = s.split_once('/')?;
        if class.is_empty() {
            return None;
        }
        let class_name = if class.starts_with('.') {
            format!("{}{}", package, class)
        } else {
            class.to_string()
        };
        Some(Self::new(package, class_name))
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten_to_short_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_flatten_short() {
        let name = ComponentName::new(
            "com.example.android.deviceowner",
            "com.example.android.deviceowner.DeviceOwnerReceiver",
        );
        assert_eq!(
            name.flatten_to_short_string(),
            "com.example.android.deviceowner/.DeviceOwnerReceiver"
        );

        let foreign = ComponentName::new("com.example.app", "org.other.Receiver");
        assert_eq!(foreign.flatten_to_short_string(), "com.example.app/org.other.Receiver");

        // A shared prefix that is not a package boundary is kept whole.
        let lookalike = ComponentName::new("com.example.app", "com.example.appx.Receiver");
        assert_eq!(
            lookalike.flatten_to_short_string(),
            "com.example.app/com.example.appx.Receiver"
        );
    }

    #[test]
    fn test_component_unflatten() {
        let name =
            ComponentName::unflatten_from_string("com.example.android.deviceowner/.DeviceOwnerReceiver")
                .unwrap();
        assert_eq!(name.package_name, "com.example.android.deviceowner");
        assert_eq!(
            name.class_name,
            "com.example.android.deviceowner.DeviceOwnerReceiver"
        );
        assert!(ComponentName::unflatten_from_string("no-slash").is_none());
    }

    #[test]
    fn test_component_unflatten_requires_class() {
        assert!(ComponentName::unflatten_from_string("com.example.app/").is_none());

        // A stored component without a class shows an empty class field.
        let mut values = ProvisioningValues::new();
        values.insert(keys::DEVICE_ADMIN_COMPONENT_NAME, "com.example.app/");
        let fields = values.fields(Capabilities::default());
        let class = fields
            .iter()
            .find(|(field, _)| *field == Field::ClassName)
            .map(|(_, text)| text.as_str());
        assert_eq!(class, Some(""));
    }

    #[test]
    fn test_edit_replaces_key() {
        let mut values = ProvisioningValues::new();
        values.apply_edit(Field::WifiSsid, "office", Capabilities::default());
        values.apply_edit(Field::Locale, "de_DE", Capabilities::default());
        assert_eq!(values.get(keys::WIFI_SSID), Some("office"));
        assert_eq!(values.get(keys::LOCALE), Some("de_DE"));
    }

    #[test]
    fn test_class_name_edit_builds_component() {
        let mut values = ProvisioningValues::new();
        values.insert(keys::DEVICE_ADMIN_PACKAGE_NAME, "com.acme.mdm");
        values.apply_edit(Field::ClassName, "com.acme.mdm.AdminReceiver", Capabilities::default());
        assert_eq!(
            values.get(keys::DEVICE_ADMIN_COMPONENT_NAME),
            Some("com.acme.mdm/.AdminReceiver")
        );

        values.apply_edit(Field::ClassName, "", Capabilities::default());
        assert!(!values.contains_key(keys::DEVICE_ADMIN_COMPONENT_NAME));
    }

    #[test]
    fn test_class_name_edit_ignored_without_component_support() {
        let mut values = ProvisioningValues::new();
        values.apply_edit(Field::ClassName, "com.acme.Receiver", Capabilities::legacy());
        assert!(values.is_empty());
    }

    #[test]
    fn test_fields_view() {
        let values: ProvisioningValues = [
            (keys::DEVICE_ADMIN_PACKAGE_NAME, "com.acme.mdm"),
            (keys::DEVICE_ADMIN_COMPONENT_NAME, "com.acme.mdm/.AdminReceiver"),
            (keys::TIME_ZONE, "Europe/Oslo"),
        ]
        .into_iter()
        .collect();

        let fields = values.fields(Capabilities::default());
        assert_eq!(fields.len(), Field::ALL.len());
        assert!(fields.contains(&(Field::ClassName, "com.acme.mdm.AdminReceiver".to_string())));
        assert!(fields.contains(&(Field::Timezone, "Europe/Oslo".to_string())));
        assert!(fields.contains(&(Field::WifiSsid, String::new())));

        let legacy = values.fields(Capabilities::legacy());
        assert!(legacy.iter().all(|(field, _)| *field != Field::ClassName));
    }

    #[test]
    fn test_parse_edit() {
        let (field, value) = parse_edit("wifi-ssid=my=net").unwrap();
        assert_eq!(field, Field::WifiSsid);
        assert_eq!(value, "my=net");
        assert!(matches!(
            parse_edit("nonsense=1"),
            Err(ProvisioningError::UnknownField(_))
        ));
        assert!(matches!(
            parse_edit("locale"),
            Err(ProvisioningError::InvalidEdit(_))
        ));
    }
}
