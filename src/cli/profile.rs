//! Managed-profile subcommands

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the profile subcommand
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Managed-profile state directory (overrides config)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileAction {
    /// Print the request that starts managed-profile provisioning
    Request,

    /// Name and enable the managed profile (runs once)
    Complete {
        /// Profile name (overrides config)
        #[arg(long)]
        name: Option<String>,
    },

    /// Show post-provisioning state
    Status,
}
