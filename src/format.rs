//! Output formatting utilities for markdown and JSON.

use crate::host::Capabilities;
use crate::keys;
use crate::loader::decode_admin_extras;
use crate::properties::Properties;
use crate::values::ProvisioningValues;
use serde_json::{Map, Value, json};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

/// Format loaded values as markdown: the editable fields, then every entry.
pub fn format_values_markdown(values: &ProvisioningValues, caps: Capabilities) -> String {
    let mut md = String::new();

    md.push_str("# Provisioning values\n\n");
    match values.loaded_file() {
        Some(file) => md.push_str(&format!("- **source**: `{}`\n", file)),
        None => md.push_str("- **source**: file not read, system defaults only\n"),
    }
    md.push('\n');

    md.push_str("## Fields\n");
    for (field, text) in values.fields(caps) {
        if field.key() == Some(keys::ADMIN_EXTRAS_BUNDLE) {
            continue;
        }
        if text.is_empty() {
            md.push_str(&format!("- **{}**: _(empty)_\n", field));
        } else {
            md.push_str(&format!("- **{}**: {}\n", field, text));
        }
    }

    if let Some(extras) = decode_admin_extras(values).filter(|e| !e.is_empty()) {
        md.push_str("\n## Admin extras\n");
        for (key, value) in extras.iter() {
            md.push_str(&format!("- `{}` = {}\n", key, value));
        }
    }

    md.push_str("\n## All entries\n");
    for (key, value) in values.iter() {
        if key == keys::LOADED_FILENAME {
            continue;
        }
        md.push_str(&format!("- `{}`\n", key));
        for line in value.lines() {
            md.push_str(&format!("    {}\n", line));
        }
    }

    md
}

/// Format loaded values as JSON, with the extras bundle decoded alongside.
pub fn format_values_json(values: &ProvisioningValues) -> Value {
    let entries: Map<String, Value> = values
        .iter()
        .filter(|(key, _)| *key != keys::LOADED_FILENAME)
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();

    json!({
        "source": values.loaded_file(),
        "values": entries,
        "admin_extras": decode_admin_extras(values).map(|e| properties_json(&e)),
    })
}

/// Properties as a flat JSON object.
pub fn properties_json(props: &Properties) -> Value {
    Value::Object(
        props
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
    )
}

/// Properties as markdown list items.
pub fn format_properties_markdown(title: &str, props: &Properties) -> String {
    let mut md = format!("# {} ({})\n\n", title, props.len());
    for (key, value) in props.iter() {
        md.push_str(&format!("- `{}` = {}\n", key, value));
    }
    md
}
