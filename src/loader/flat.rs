//! Flat `key=value` provisioning file parser.

use super::extras::gather_admin_extras;
use crate::error::{ProvisioningError, ProvisioningResult};
use crate::values::ProvisioningValues;
use std::borrow::Cow;
use std::path::Path;
use tracing::{trace, warn};

/// Parse flat text into `values`.
///
/// Lines starting with `#` are comments. Every other line is split on its
/// first `=`; lines without one are ignored. Keys and values are taken
/// verbatim, and later lines win over earlier ones.
pub fn parse_flat(text: &str, values: &mut ProvisioningValues) {
    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        trace!(key, value, "Read provisioning value");
        values.insert(key, value);
    }
}

/// Read a flat file into `values`, then fold unrecognized keys into the
/// admin extras bundle.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than failing the
/// whole file.
pub fn load_flat_file(path: &Path, values: &mut ProvisioningValues) -> ProvisioningResult<()> {
    let bytes = std::fs::read(path).map_err(|e| ProvisioningError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        warn!(path = %path.display(), "Provisioning file is not valid UTF-8, replacing bad bytes");
    }
    parse_flat(&text, values);
    gather_admin_extras(values);
    Ok(())
}
