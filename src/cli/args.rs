// file: src/cli/args.rs
// version: 2.0.0
// guid: f6a7b8c9-d0e1-2345-6789-012345fabcde

//! Command line argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hci-installer")]
#[command(about = "Validate HCI installer configuration and render node stage documents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "HCI_INSTALLER_SETTINGS")]
    pub settings: Option<PathBuf>,
}

/// Where the installer configuration comes from
#[derive(Args, Debug, Clone)]
pub struct ConfigSource {
    /// Configuration document: a file path or http(s) URL
    #[arg(short, long)]
    pub config: Option<String>,

    /// File holding a kernel command line with harvester.* parameters
    #[arg(long)]
    pub cmdline_file: Option<PathBuf>,

    /// Substitute ${VAR} references in a local config file from the environment
    #[arg(long)]
    pub expand_env: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an installer configuration
    Validate {
        #[command(flatten)]
        source: ConfigSource,

        /// Skip interface and disk lookups on this host
        #[arg(long)]
        skip_host_checks: bool,
    },

    /// Render the stage document for a configuration
    Render {
        #[command(flatten)]
        source: ConfigSource,

        /// Render the single-stage document for an installed node
        #[arg(long)]
        live: bool,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        skip_host_checks: bool,
    },

    /// Print the environment handed to the OS installer
    Env {
        #[command(flatten)]
        source: ConfigSource,
    },

    /// Compute the persistent partition size for a disk
    PartitionSize {
        /// Disk size in bytes
        #[arg(long, conflicts_with = "device")]
        disk_size_bytes: Option<u64>,

        /// Block device to look up on this host
        #[arg(short, long)]
        device: Option<String>,

        /// Requested size, such as 150Gi or 204800Mi
        #[arg(short, long)]
        size: Option<String>,

        #[arg(long)]
        skip_checks: bool,
    },

    /// Parse a kernel command line and print the resulting configuration
    Cmdline {
        /// Command line text; read from --file otherwise
        text: Option<String>,

        #[arg(short, long, default_value = "/proc/cmdline")]
        file: PathBuf,
    },

    /// Send the webhooks registered for an install event
    Webhook {
        #[command(flatten)]
        source: ConfigSource,

        #[arg(short, long, value_enum)]
        event: EventArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EventArg {
    Started,
    Succeeded,
    Failed,
}

impl From<EventArg> for crate::webhook::WebhookEvent {
    fn from(event: EventArg) -> Self {
        match event {
            EventArg::Started => Self::Started,
            EventArg::Succeeded => Self::Succeeded,
            EventArg::Failed => Self::Failed,
        }
    }
}
