//! Deep merge of configuration tiers.
//!
//! Objects merge field by field with the higher tier winning; any other
//! value, arrays included, is replaced whole.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// A null in `overlay` means "not specified" and keeps the base value.
///
/// # Example
/// ```
/// use serde_json::json;
/// use nfc_provisioning::config::deep_merge;
///
/// let base = json!({
///     "storage": { "dir": ".", "text_file": "nfcprovisioning.txt" },
///     "platform": { "api_level": 23 }
/// });
/// let overlay = json!({ "storage": { "dir": "/sdcard" } });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result["storage"]["dir"], "/sdcard");
/// assert_eq!(result["storage"]["text_file"], "nfcprovisioning.txt");
/// assert_eq!(result["platform"]["api_level"], 23);
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later tiers taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sections_merge_field_by_field() {
        let base = json!({
            "defaults": {
                "admin_package": "com.example.android.deviceowner",
                "admin_component": "com.example.android.deviceowner/.DeviceOwnerReceiver"
            },
            "nfc": {"comment": "NFC provisioning"}
        });
        let overlay = json!({"defaults": {"admin_package": "com.acme.mdm"}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["defaults"]["admin_package"], "com.acme.mdm");
        assert_eq!(
            result["defaults"]["admin_component"],
            "com.example.android.deviceowner/.DeviceOwnerReceiver"
        );
        assert_eq!(result["nfc"]["comment"], "NFC provisioning");
    }

    #[test]
    fn test_null_keeps_lower_tier() {
        let base = json!({"platform": {"api_level": 23}});
        let overlay = json!({"platform": {"api_level": null}});
        assert_eq!(deep_merge(base, overlay), json!({"platform": {"api_level": 23}}));
    }

    #[test]
    fn test_scalars_and_arrays_replaced() {
        let base = json!({"storage": {"dir": "."}, "list": [1, 2, 3]});
        let overlay = json!({"storage": "flat", "list": [4]});
        assert_eq!(deep_merge(base, overlay), json!({"storage": "flat", "list": [4]}));
    }

    #[test]
    fn test_merge_all_later_tiers_win() {
        let tiers = vec![
            json!({"platform": {"api_level": 23}, "storage": {"dir": "."}}),
            json!({"platform": {"api_level": 21}}),
            json!({"storage": {"dir": "/media/usb"}}),
        ];
        assert_eq!(
            deep_merge_all(tiers),
            json!({"platform": {"api_level": 21}, "storage": {"dir": "/media/usb"}})
        );
    }
}
