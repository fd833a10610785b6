//! NFC provisioning library
//!
//! Resolves device-provisioning values from provisioning files and host
//! defaults, and serializes them into the NFC message that bootstraps a
//! device owner. Also covers the managed-profile provisioning request and
//! its post-provisioning step.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod keys;
pub mod loader;
pub mod logging;
pub mod nfc;
pub mod profile;
pub mod properties;
pub mod values;
