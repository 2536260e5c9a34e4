// file: src/cli/commands.rs
// version: 2.0.0
// guid: a7b8c9d0-e1f2-3456-7890-123456abcdef

//! Command implementations for the CLI

use super::args::ConfigSource;
use crate::{
    config::{
        cmdline::parse_cmdline,
        loader::{read_cmdline, ConfigLoader},
        validator::{resolve_interfaces, validate, ConfigValidator, HostValidator, NoopValidator},
        HarvesterConfig,
    },
    env::install_env,
    logging::with_operation_span,
    partition::persistent_partition_size_mib,
    settings::Settings,
    stages::{generate_bootstrap_config, to_install_stage},
    utils::{network::lookup_interface, units::mib_to_byte, units::human_size, HostInventory, SystemInventory},
    webhook::{webhook_context, WebhookEvent, WebhookSender},
};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load the configuration named by `source`
pub async fn load_config(source: &ConfigSource) -> Result<HarvesterConfig> {
    let cmdline = match &source.cmdline_file {
        Some(path) => Some(read_cmdline(path).context("Failed to read kernel command line")?),
        None => None,
    };
    if source.config.is_none() && cmdline.is_none() {
        bail!("no configuration given, use --config or --cmdline-file");
    }

    let mut loader = ConfigLoader::new();
    if source.expand_env {
        loader = loader.with_env_expansion();
    }
    let config = loader
        .load(source.config.as_deref(), cmdline.as_deref())
        .await
        .context("Failed to load installer configuration")?;
    debug!("Loaded configuration:\n{}", config);
    Ok(config)
}

fn check(config: &HarvesterConfig, skip_host_checks: bool) -> Result<()> {
    let validator: Box<dyn ConfigValidator> = if skip_host_checks {
        warn!("Skipping host interface and disk checks");
        Box::new(NoopValidator)
    } else {
        Box::new(HostValidator::new(SystemInventory))
    };
    validate(config, validator.as_ref())?;
    Ok(())
}

/// Validate an installer configuration
pub async fn validate_command(source: &ConfigSource, skip_host_checks: bool) -> Result<()> {
    let config = load_config(source).await?;
    check(&config, skip_host_checks)?;
    println!("{} configuration is valid (mode: {})", "✓".green(), config.install.mode());
    Ok(())
}

/// Render the install or live stage document
pub async fn render_command(
    source: &ConfigSource,
    live: bool,
    output: Option<PathBuf>,
    skip_host_checks: bool,
) -> Result<()> {
    let mut config = load_config(source).await?;
    check(&config, skip_host_checks)?;
    if !skip_host_checks {
        resolve_interfaces(&mut config, &SystemInventory).context("Failed to resolve interfaces")?;
    }

    let document = with_operation_span(if live { "render-live" } else { "render-install" }, || {
        if live {
            generate_bootstrap_config(&config)
        } else {
            to_install_stage(&config)
        }
    })?;
    let yaml = document.to_yaml()?;

    match output {
        Some(path) => {
            write_document(&path, &yaml).await?;
            info!("Stage document written to {}", path.display());
            println!("{} wrote {}", "✓".green(), path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

async fn write_document(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Print the environment handed to the OS installer
pub async fn env_command(source: &ConfigSource) -> Result<()> {
    let config = load_config(source).await?;
    for line in install_env(&config)? {
        println!("{}", line);
    }
    Ok(())
}

/// Compute the persistent partition size
pub fn partition_size_command(
    disk_size_bytes: Option<u64>,
    device: Option<&str>,
    size: Option<&str>,
    skip_checks: bool,
) -> Result<()> {
    let disk_size = match (disk_size_bytes, device) {
        (Some(bytes), _) => bytes,
        (None, Some(device)) => SystemInventory
            .block_devices()?
            .into_iter()
            .find(|d| d.path == device)
            .map(|d| d.size_bytes)
            .with_context(|| format!("Block device {} not found", device))?,
        (None, None) => bail!("either --disk-size-bytes or --device is required"),
    };

    let mib = persistent_partition_size_mib(disk_size, size.unwrap_or_default(), skip_checks)?;
    println!(
        "{} {} ({} MiB) on a {} disk",
        "persistent partition:".bold(),
        human_size(mib_to_byte(mib)),
        mib,
        human_size(disk_size)
    );
    Ok(())
}

/// Parse a kernel command line and print the sanitized configuration
pub fn cmdline_command(text: Option<&str>, file: &Path) -> Result<()> {
    let text = match text {
        Some(text) => text.to_string(),
        None => read_cmdline(file)?,
    };
    let config = parse_cmdline(&text)?;
    print!("{}", config);
    Ok(())
}

/// Send the webhooks registered for `event`
pub async fn webhook_command(source: &ConfigSource, event: WebhookEvent, settings: &Settings) -> Result<()> {
    let config = load_config(source).await?;

    let interfaces = SystemInventory.interfaces().unwrap_or_else(|e| {
        warn!("Failed to list host interfaces: {}", e);
        Vec::new()
    });
    let mgmt = config.install.management_interface.clone();
    let iface = lookup_interface(&interfaces, &mgmt.interface, &mgmt.hw_addr);
    let context = webhook_context(&config.os.hostname, iface);

    let sender = WebhookSender::from_settings(&settings.webhook)?;
    let total = config.webhooks.iter().filter(|w| w.event == event.as_str()).count();
    let delivered = sender.send_event(&config.webhooks, event, &context).await;

    if delivered == total {
        println!("{} delivered {}/{} {} webhook(s)", "✓".green(), delivered, total, event);
    } else {
        println!("{} delivered {}/{} {} webhook(s)", "!".yellow(), delivered, total, event);
    }
    Ok(())
}
