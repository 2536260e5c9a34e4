// file: src/main.rs
// version: 2.0.0
// guid: h8i9j0k1-a2b3-4567-8901-234567abcdef

//! HCI installer configuration engine - main entry point

use anyhow::Result;
use clap::Parser;
use hci_installer::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging::{init_logger, LogOptions},
    settings::Settings,
};
use tokio::signal;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.settings.as_deref()).await?;
    if let Some(path) = init_logger(&LogOptions::new(&settings.logging, cli.verbose, cli.quiet))? {
        debug!("Logging to {}", path.display());
    }

    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        warn!("Received Ctrl+C, shutting down");
    };

    let command_future = async {
        match &cli.command {
            Commands::Validate {
                source,
                skip_host_checks,
            } => validate_command(source, *skip_host_checks).await,
            Commands::Render {
                source,
                live,
                output,
                skip_host_checks,
            } => render_command(source, *live, output.clone(), *skip_host_checks).await,
            Commands::Env { source } => env_command(source).await,
            Commands::PartitionSize {
                disk_size_bytes,
                device,
                size,
                skip_checks,
            } => partition_size_command(*disk_size_bytes, device.as_deref(), size.as_deref(), *skip_checks),
            Commands::Cmdline { text, file } => cmdline_command(text.as_deref(), file),
            Commands::Webhook { source, event } => {
                webhook_command(source, (*event).into(), &settings).await
            }
        }
    };

    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            warn!("Interrupted by user");
            std::process::exit(130);
        }
    }
}
