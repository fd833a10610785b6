//! NFC provisioning CLI
//!
//! Loads provisioning values, applies edits, and writes or decodes the NFC
//! provisioning message.

use anyhow::{Context, Result, bail};
use clap::Parser;
use nfc_provisioning::cli::payload::{DecodeArgs, PayloadArgs};
use nfc_provisioning::cli::profile::{ProfileAction, ProfileArgs};
use nfc_provisioning::cli::{Cli, Command, EditArgs, ShowArgs};
use nfc_provisioning::config::{Config, ConfigLoader, ConfigPaths};
use nfc_provisioning::format::{
    OutputFormat, format_properties_markdown, format_values_json, format_values_markdown,
    properties_json,
};
use nfc_provisioning::host::SystemHost;
use nfc_provisioning::loader::{LoaderSettings, ValuesLoader};
use nfc_provisioning::logging::{self, LogTarget};
use nfc_provisioning::nfc::{NdefMessage, NfcMessageBuilder, decode_provisioning_message};
use nfc_provisioning::profile::{FileDevicePolicy, PostProvisioning, managed_profile_request};
use nfc_provisioning::values::ProvisioningValues;
use serde_json::json;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let mut loader = ConfigLoader::load_with_paths(paths)?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Using config file");
    }

    // Override from CLI arguments
    let config = loader.config_mut();
    if let Some(dir) = &cli.storage_dir {
        config.storage.dir = dir.clone();
    }
    if let Some(api_level) = cli.api_level {
        config.platform.api_level = api_level;
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Show(args)) => run_show(&config, args).await?,
        Some(Command::Payload(args)) => run_payload(&config, args).await?,
        Some(Command::Decode(args)) => run_decode(args)?,
        Some(Command::Profile(args)) => run_profile(config, args)?,
        None => run_show(&config, ShowArgs::default()).await?,
    }

    Ok(())
}

/// Load values off the main task and apply command-line edits.
async fn load_edited_values(config: &Config, edits: &EditArgs) -> Result<Option<ProvisioningValues>> {
    let loader = ValuesLoader::new(LoaderSettings::from_config(config), Arc::new(SystemHost::new()));
    let Some(mut values) = loader.start_loading().await? else {
        return Ok(None);
    };
    if values.loaded_file().is_none() {
        warn!(
            dir = %config.storage.dir.display(),
            "Provisioning file not read, using system defaults"
        );
    }
    let caps = config.capabilities();
    for (field, text) in &edits.edits {
        values.apply_edit(*field, text, caps);
    }
    Ok(Some(values))
}

async fn run_show(config: &Config, args: ShowArgs) -> Result<()> {
    let Some(values) = load_edited_values(config, &args.edits).await? else {
        bail!("provisioning values were not delivered");
    };
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&format_values_json(&values))?),
        OutputFormat::Markdown => print!("{}", format_values_markdown(&values, config.capabilities())),
    }
    Ok(())
}

async fn run_payload(config: &Config, args: PayloadArgs) -> Result<()> {
    let values = load_edited_values(config, &args.edits).await?;
    let builder = NfcMessageBuilder::new(config.capabilities()).with_comment(&config.nfc.comment);
    let Some(message) = builder.create_ndef_message(values.as_ref())? else {
        bail!("no provisioning values loaded, nothing to send");
    };
    let bytes = args.encoding.encode(&message.to_bytes()?);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "Wrote NFC provisioning message");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let data = if args.reads_stdin() {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        data
    } else {
        std::fs::read(&args.input)
            .with_context(|| format!("failed to read {}", args.input.display()))?
    };
    let message = NdefMessage::parse(&args.encoding.decode(&data)?)?;
    let props = decode_provisioning_message(&message)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&properties_json(&props))?),
        OutputFormat::Markdown => print!("{}", format_properties_markdown("NFC provisioning payload", &props)),
    }
    Ok(())
}

fn run_profile(config: Config, args: ProfileArgs) -> Result<()> {
    let caps = config.capabilities();
    let mut profile = config.profile;
    if let Some(dir) = args.state_dir {
        profile.state_dir = dir;
    }
    let admin = profile.admin();

    match args.action {
        ProfileAction::Request => {
            let request = managed_profile_request(caps, &admin);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        ProfileAction::Complete { name } => {
            let name = name.unwrap_or(profile.name);
            let mut policy = FileDevicePolicy::new(&profile.state_dir);
            let post = PostProvisioning::new(&profile.state_dir);
            if post.complete(&mut policy, &admin, &name)? {
                println!("Managed profile '{}' enabled", name);
            } else {
                println!("Post-provisioning already done");
            }
        }
        ProfileAction::Status => {
            let post = PostProvisioning::new(&profile.state_dir);
            let state = FileDevicePolicy::new(&profile.state_dir).state()?;
            let status = json!({
                "state_dir": profile.state_dir,
                "done": post.is_done()?,
                "profile": state,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
