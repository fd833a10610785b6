//! End-to-end tests for value loading and NFC message building.
//!
//! Each test lays out provisioning files in a temp directory, loads them
//! through the public loader API, and checks the resolved values or the
//! decoded NFC payload.

use nfc_provisioning::host::{Capabilities, FixedHost, HostEnvironment, SystemHost};
use nfc_provisioning::keys;
use nfc_provisioning::loader::{LoaderSettings, ValuesLoader, decode_admin_extras, load_values};
use nfc_provisioning::nfc::{NdefMessage, NfcMessageBuilder, decode_provisioning_message};
use nfc_provisioning::values::{Field, ProvisioningValues};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn host_on_wifi(ssid: &str) -> FixedHost {
    FixedHost::new("en_GB", "Europe/London").with_wifi(ssid)
}

fn load_with(dir: &TempDir, host: &dyn HostEnvironment) -> ProvisioningValues {
    load_values(&LoaderSettings::new(dir.path()), host)
}

/// Encode and decode the message for `values`, returning the payload body.
fn payload_properties(
    values: &ProvisioningValues,
    caps: Capabilities,
) -> nfc_provisioning::properties::Properties {
    let message = NfcMessageBuilder::new(caps)
        .create_ndef_message(Some(values))
        .unwrap()
        .unwrap();
    let parsed = NdefMessage::parse(&message.to_bytes().unwrap()).unwrap();
    decode_provisioning_message(&parsed).unwrap()
}

#[test]
fn flat_file_comments_are_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.txt"),
        "android.app.extra.PROVISIONING_LOCALE=1\n#comment\nandroid.app.extra.PROVISIONING_TIME_ZONE=2\n",
    )
    .unwrap();

    let values = load_with(&dir, &host_on_wifi("x"));
    assert_eq!(values.get(keys::LOCALE), Some("1"));
    assert_eq!(values.get(keys::TIME_ZONE), Some("2"));
    assert!(values.keys().all(|k| !k.starts_with('#')));
}

#[test]
fn orphaned_keys_move_into_extras_bundle() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.txt"),
        "android.app.extra.PROVISIONING_WIFI_SSID=corp\n\
         com.acme.enrollment_url=https://mdm.acme.com/enroll?id=7\n\
         site=berlin\n",
    )
    .unwrap();

    let values = load_with(&dir, &host_on_wifi("x"));
    assert!(!values.contains_key("com.acme.enrollment_url"));
    assert!(!values.contains_key("site"));

    let extras = decode_admin_extras(&values).unwrap();
    assert_eq!(
        extras.get("com.acme.enrollment_url"),
        Some("https://mdm.acme.com/enroll?id=7")
    );
    assert_eq!(extras.get("site"), Some("berlin"));

    // The bundle survives the trip through the NFC payload unchanged.
    let payload = payload_properties(&values, Capabilities::default());
    let carried = nfc_provisioning::properties::Properties::load(
        payload.get(keys::ADMIN_EXTRAS_BUNDLE).unwrap(),
    )
    .unwrap();
    assert_eq!(carried, extras);
}

#[test]
fn flat_file_without_orphans_still_sends_empty_bundle() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.txt"),
        "android.app.extra.PROVISIONING_LOCALE=de_DE\n",
    )
    .unwrap();

    let values = load_with(&dir, &host_on_wifi("x"));
    assert!(decode_admin_extras(&values).unwrap().is_empty());

    let payload = payload_properties(&values, Capabilities::default());
    let carried = nfc_provisioning::properties::Properties::load(
        payload.get(keys::ADMIN_EXTRAS_BUNDLE).unwrap(),
    )
    .unwrap();
    assert!(carried.is_empty());
}

#[test]
fn missing_files_still_yield_locale_and_timezone() {
    let dir = TempDir::new().unwrap();
    let values = load_with(&dir, &SystemHost::new());
    assert_eq!(values.loaded_file(), None);
    assert!(!values.get(keys::LOCALE).unwrap_or_default().is_empty());
    assert!(!values.get(keys::TIME_ZONE).unwrap_or_default().is_empty());
}

#[test]
fn file_ssid_is_not_overridden_by_host() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.txt"),
        "android.app.extra.PROVISIONING_WIFI_SSID=from-file\n",
    )
    .unwrap();

    let values = load_with(&dir, &host_on_wifi("\"from-host\""));
    assert_eq!(values.get(keys::WIFI_SSID), Some("from-file"));
}

#[test]
fn host_ssid_is_unquoted_then_requoted_once() {
    let dir = TempDir::new().unwrap();
    let values = load_with(&dir, &host_on_wifi("\"home\""));
    assert_eq!(values.get(keys::WIFI_SSID), Some("home"));

    let payload = payload_properties(&values, Capabilities::default());
    assert_eq!(payload.get(keys::WIFI_SSID), Some("\"home\""));
}

#[test]
fn quoted_ssid_is_not_double_quoted() {
    let mut values = ProvisioningValues::new();
    values.insert(keys::WIFI_SSID, "\"home\"");
    let payload = payload_properties(&values, Capabilities::default());
    assert_eq!(payload.get(keys::WIFI_SSID), Some("\"home\""));

    values.insert(keys::WIFI_SSID, "home");
    let payload = payload_properties(&values, Capabilities::default());
    assert_eq!(payload.get(keys::WIFI_SSID), Some("\"home\""));
}

#[test]
fn json_file_with_nested_extras() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.json"),
        r#"{
            "android.app.extra.PROVISIONING_DEVICE_ADMIN_PACKAGE_NAME": "com.acme.mdm",
            "android.app.extra.PROVISIONING_DEVICE_ADMIN_COMPONENT_NAME": "com.acme.mdm/.AdminReceiver",
            "android.app.extra.PROVISIONING_WIFI_SECURITY_TYPE": "WPA",
            "android.app.extra.PROVISIONING_ADMIN_EXTRAS_BUNDLE": {
                "tenant": "acme",
                "region": "eu-west"
            }
        }"#,
    )
    .unwrap();

    let values = load_with(&dir, &host_on_wifi("guest"));
    assert!(values.loaded_file().unwrap().ends_with("nfcprovisioning.json"));
    assert_eq!(values.get(keys::WIFI_SECURITY_TYPE), Some("WPA"));
    let extras = decode_admin_extras(&values).unwrap();
    assert_eq!(extras.get("tenant"), Some("acme"));
    assert_eq!(extras.get("region"), Some("eu-west"));

    let payload = payload_properties(&values, Capabilities::default());
    assert!(!payload.contains_key(keys::DEVICE_ADMIN_PACKAGE_NAME));
    assert_eq!(
        payload.get(keys::DEVICE_ADMIN_COMPONENT_NAME),
        Some("com.acme.mdm/.AdminReceiver")
    );
    assert!(payload.contains_key(keys::LOCAL_TIME));
    assert!(!payload.contains_key(keys::LOADED_FILENAME));
}

#[test]
fn edits_flow_into_payload() {
    let dir = TempDir::new().unwrap();
    let caps = Capabilities::default();
    let mut values = load_with(&dir, &host_on_wifi("x"));

    values.apply_edit(Field::PackageName, "com.acme.mdm", caps);
    values.apply_edit(Field::ClassName, "com.acme.mdm.AdminReceiver", caps);
    values.apply_edit(Field::WifiPassword, "hunter2", caps);
    values.apply_edit(Field::WifiHidden, "", caps);

    let payload = payload_properties(&values, caps);
    assert_eq!(
        payload.get(keys::DEVICE_ADMIN_COMPONENT_NAME),
        Some("com.acme.mdm/.AdminReceiver")
    );
    assert_eq!(payload.get(keys::WIFI_PASSWORD), Some("hunter2"));
    assert!(!payload.contains_key(keys::WIFI_HIDDEN));
}

#[test]
fn legacy_platform_payload_names_package() {
    let dir = TempDir::new().unwrap();
    let settings = LoaderSettings::new(dir.path()).with_capabilities(Capabilities::legacy());
    let values = load_values(&settings, &host_on_wifi("x"));
    assert!(!values.contains_key(keys::DEVICE_ADMIN_COMPONENT_NAME));

    let payload = payload_properties(&values, Capabilities::legacy());
    assert_eq!(
        payload.get(keys::DEVICE_ADMIN_PACKAGE_NAME),
        Some("com.example.android.deviceowner")
    );
}

#[tokio::test]
async fn background_load_delivers_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nfcprovisioning.txt"),
        "android.app.extra.PROVISIONING_LOCALE=pt_BR\n",
    )
    .unwrap();

    let loader = ValuesLoader::new(
        LoaderSettings::new(dir.path()),
        Arc::new(host_on_wifi("lab")),
    );
    let values = loader.start_loading().await.unwrap().unwrap();
    assert_eq!(values.get(keys::LOCALE), Some("pt_BR"));
    assert_eq!(values.get(keys::WIFI_SSID), Some("lab"));
    assert_eq!(loader.cached(), Some(values));
}
