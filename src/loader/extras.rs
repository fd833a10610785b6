//! Folding of unrecognized keys into the admin extras bundle.

use crate::keys;
use crate::properties::{Escaping, Properties};
use crate::values::ProvisioningValues;
use tracing::debug;

/// Header comment of a serialized extras bundle.
pub const EXTRAS_BUNDLE_COMMENT: &str = "admin extras bundle";

/// Serialize a sub-bundle the way the receiving device reads it back.
pub fn serialize_bundle(bundle: &Properties) -> String {
    bundle.store(Some(EXTRAS_BUNDLE_COMMENT), Escaping::Text)
}

/// Move every key outside the recognized namespace into the extras bundle.
///
/// Orphaned keys are removed from the top level and the bundle is always
/// stored, empty when there are none. A bundle line already present in the
/// file is replaced. Returns the number of keys moved.
pub fn gather_admin_extras(values: &mut ProvisioningValues) -> usize {
    let orphans: Vec<String> = values
        .keys()
        .filter(|key| !keys::is_recognized(key))
        .map(str::to_string)
        .collect();

    let mut bundle = Properties::new();
    for key in &orphans {
        if let Some(value) = values.remove(key) {
            bundle.insert(key.clone(), value);
        }
    }

    let serialized = serialize_bundle(&bundle);
    debug!(count = orphans.len(), bundle = %serialized, "Admin extras bundle");
    if let Some(previous) = values.insert(keys::ADMIN_EXTRAS_BUNDLE, serialized) {
        debug!(previous = %previous, "Replaced admin extras bundle from file");
    }
    orphans.len()
}

/// Decode the admin extras bundle, if present and readable.
pub fn decode_admin_extras(values: &ProvisioningValues) -> Option<Properties> {
    values
        .get(keys::ADMIN_EXTRAS_BUNDLE)
        .and_then(|text| Properties::load(text).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphans_move_into_bundle() {
        let mut values: ProvisioningValues = [
            (keys::LOCALE, "en_US"),
            ("com.acme.server", "https://mdm.acme.com"),
            ("enrollment_token", "abc123"),
        ]
        .into_iter()
        .collect();

        assert_eq!(gather_admin_extras(&mut values), 2);
        assert!(!values.contains_key("com.acme.server"));
        assert!(!values.contains_key("enrollment_token"));
        assert_eq!(values.get(keys::LOCALE), Some("en_US"));

        let bundle = decode_admin_extras(&values).unwrap();
        assert_eq!(bundle.get("com.acme.server"), Some("https://mdm.acme.com"));
        assert_eq!(bundle.get("enrollment_token"), Some("abc123"));
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_empty_bundle_stored_without_orphans() {
        let mut values: ProvisioningValues = [(keys::TIME_ZONE, "UTC")].into_iter().collect();
        assert_eq!(gather_admin_extras(&mut values), 0);
        assert_eq!(values.get(keys::TIME_ZONE), Some("UTC"));

        let bundle = decode_admin_extras(&values).unwrap();
        assert!(bundle.is_empty());
        assert!(
            values
                .get(keys::ADMIN_EXTRAS_BUNDLE)
                .unwrap()
                .starts_with(&format!("#{}\n", EXTRAS_BUNDLE_COMMENT))
        );
    }

    #[test]
    fn test_bundle_line_from_file_is_replaced() {
        let mut values: ProvisioningValues = [
            (keys::ADMIN_EXTRAS_BUNDLE, "foo"),
            ("floor", "3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(gather_admin_extras(&mut values), 1);

        let bundle = decode_admin_extras(&values).unwrap();
        assert_eq!(bundle.get("floor"), Some("3"));
        assert!(!bundle.contains_key("foo"));
        assert_eq!(bundle.len(), 1);
    }
}
