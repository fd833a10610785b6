//! CLI command definitions for nfc-provisioning
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod payload;
pub mod profile;

use crate::format::OutputFormat;
use crate::values::{Field, parse_edit};
use clap::{Args, Parser, Subcommand};
use payload::{DecodeArgs, PayloadArgs};
use profile::ProfileArgs;
use std::path::PathBuf;

/// Prepare device-provisioning values and NFC provisioning payloads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (replaces project and user config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding nfcprovisioning.json / nfcprovisioning.txt (overrides config)
    #[arg(short, long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// API level of the device being provisioned (overrides config)
    #[arg(long, global = true)]
    pub api_level: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load provisioning values and print them (default if no subcommand given)
    Show(ShowArgs),

    /// Build the NFC provisioning message
    Payload(PayloadArgs),

    /// Decode an NFC provisioning message
    Decode(DecodeArgs),

    /// Managed-profile provisioning
    Profile(ProfileArgs),
}

/// Field edits applied after loading, as `FIELD=VALUE`.
///
/// Fields: package_name, class_name, locale, timezone, wifi_ssid,
/// wifi_security_type, wifi_hidden, wifi_password, extras
#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_edit_arg)]
    pub edits: Vec<(Field, String)>,
}

fn parse_edit_arg(s: &str) -> Result<(Field, String), String> {
    parse_edit(s).map_err(|e| e.to_string())
}

/// Arguments for the show subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub edits: EditArgs,
}
