//! JSON provisioning file parser.

use super::extras::serialize_bundle;
use crate::error::{ProvisioningError, ProvisioningResult};
use crate::properties::Properties;
use crate::values::ProvisioningValues;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// String form used for a JSON scalar stored as a provisioning value.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Copy a parsed JSON object into `values`.
///
/// Strings are copied as they are; nested objects become a serialized
/// sub-bundle stored under their key, skipping entries whose text is empty.
/// Other scalars are stored by their JSON text and nulls are skipped.
pub fn apply_json_object(object: &Map<String, Value>, values: &mut ProvisioningValues) {
    for (key, value) in object {
        match value {
            Value::Null => {
                debug!(key = %key, "Skipping null provisioning value");
            }
            Value::String(s) => {
                values.insert(key.clone(), s.clone());
            }
            Value::Object(nested) => {
                let bundle: Properties = nested
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), scalar_text(v)))
                    .filter(|(_, v)| !v.is_empty())
                    .collect();
                values.insert(key.clone(), serialize_bundle(&bundle));
            }
            other => {
                values.insert(key.clone(), scalar_text(other));
            }
        }
    }
}

/// Parse JSON text into `values`. The root must be an object.
pub fn parse_json(text: &str, path: &Path, values: &mut ProvisioningValues) -> ProvisioningResult<()> {
    let root: Value = serde_json::from_str(text).map_err(|source| ProvisioningError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Object(object) = root else {
        return Err(ProvisioningError::NotAnObject(path.to_path_buf()));
    };
    apply_json_object(&object, values);
    Ok(())
}

/// Read a JSON file into `values`.
///
/// On error `values` is left untouched.
pub fn load_json_file(path: &Path, values: &mut ProvisioningValues) -> ProvisioningResult<()> {
    let text = std::fs::read_to_string(path).map_err(|e| ProvisioningError::io(path, e))?;
    let mut parsed = ProvisioningValues::new();
    parse_json(&text, path, &mut parsed)?;
    for (key, value) in parsed.iter() {
        values.insert(key, value);
    }
    Ok(())
}
