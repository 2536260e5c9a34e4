// file: src/stages/rancherd.rs
// version: 1.0.0
// guid: 2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f6a

//! Cluster bootstrap stage: rancherd and RKE2 configuration

use super::network::{apply_networks, apply_wifi, collect_dns_servers, static_dns_command};
use super::templates::{TemplateRenderer, RANCHERD_CONFIG, RKE2_AGENT_CONFIG, RKE2_SERVER_CONFIG};
use super::{Directory, File, Stage, YipConfig};
use crate::config::HarvesterConfig;
use crate::kubelet::kubelet_args;
use crate::Result;
use serde_json::json;
use tracing::{debug, info};

pub const RANCHERD_CONFIG_DIR: &str = "/etc/rancher/rancherd";
pub const RANCHERD_CONFIG_FILE: &str = "/etc/rancher/rancherd/config.yaml";
pub const RKE2_CONFIG_DIR: &str = "/etc/rancher/rke2/config.yaml.d";
pub const RKE2_SERVER_CONFIG_FILE: &str = "/etc/rancher/rke2/config.yaml.d/90-harvester-server.yaml";
pub const RKE2_AGENT_CONFIG_FILE: &str = "/etc/rancher/rke2/config.yaml.d/90-harvester-agent.yaml";

/// Stage name of documents applied to an already installed node
pub const LIVE_STAGE: &str = "live";

const DEFAULT_RUNTIME_VERSION: &str = "v1.27.10+rke2r1";
const DEFAULT_RANCHER_VERSION: &str = "v2.8.2";

/// Kubernetes runtime version baked in at build time
pub fn default_runtime_version() -> &'static str {
    option_env!("HARVESTER_RUNTIME_VERSION").unwrap_or(DEFAULT_RUNTIME_VERSION)
}

/// Rancher version baked in at build time
pub fn default_rancher_version() -> &'static str {
    option_env!("HARVESTER_RANCHER_VERSION").unwrap_or(DEFAULT_RANCHER_VERSION)
}

/// Build the stage that brings up rancherd on first boot
pub fn to_bootstrap_stage(config: &HarvesterConfig) -> Result<Stage> {
    let renderer = TemplateRenderer::new()?;
    bootstrap_stage(&renderer, config)
}

pub(crate) fn bootstrap_stage(renderer: &TemplateRenderer, config: &HarvesterConfig) -> Result<Stage> {
    let mut config = config.clone();
    if config.runtime_version.is_empty() {
        config.runtime_version = default_runtime_version().to_string();
    }
    if config.rancher_version.is_empty() {
        config.rancher_version = default_rancher_version().to_string();
    }
    let founding = config.server_url.is_empty();
    debug!(
        "Rendering rancherd config (runtime {}, founding node: {})",
        config.runtime_version, founding
    );

    let mut stage = Stage::named("Configure rancherd");
    stage.directories.push(Directory {
        path: RANCHERD_CONFIG_DIR.to_string(),
        permissions: 0o700,
        ..Default::default()
    });

    let rancherd = renderer.render(
        RANCHERD_CONFIG,
        &json!({
            "serverUrl": config.server_url,
            "token": config.token,
            "runtimeVersion": config.runtime_version,
            "rancherVersion": config.rancher_version,
            "addons": config.addons,
        }),
    )?;
    stage.files.push(File::new(RANCHERD_CONFIG_FILE, rancherd, 0o600));

    if founding {
        let server = renderer.render(
            RKE2_SERVER_CONFIG,
            &json!({
                "hostname": config.os.hostname,
                "vip": config.install.vip,
            }),
        )?;
        stage.files.push(File::new(RKE2_SERVER_CONFIG_FILE, server, 0o600));
    }

    let agent = renderer.render(
        RKE2_AGENT_CONFIG,
        &json!({ "kubeletArgs": kubelet_args(&config.os.labels)? }),
    )?;
    stage.files.push(File::new(RKE2_AGENT_CONFIG_FILE, agent, 0o600));

    stage.set_login(&config.os.ssh_authorized_keys, &config.os.password);
    Ok(stage)
}

/// Build a single `live` stage configuring an already installed node.
/// Wifi and the management network are brought up immediately.
pub fn generate_bootstrap_config(config: &HarvesterConfig) -> Result<YipConfig> {
    info!("Generating live bootstrap config");
    let renderer = TemplateRenderer::new()?;
    let mut stage = bootstrap_stage(&renderer, config)?;
    stage.name = "Harvester live configuration".to_string();
    stage.hostname = config.os.hostname.clone();

    if !config.os.ntp_servers.is_empty() {
        stage
            .timesyncd
            .insert("NTP".to_string(), config.os.ntp_servers.join(" "));
    }

    let mgmt: Vec<_> = config.management_network().into_iter().cloned().collect();
    let dns = collect_dns_servers(&config.os.dns_nameservers, &mgmt);
    if !dns.is_empty() {
        stage.commands.push(static_dns_command(&dns));
    }

    apply_wifi(&renderer, &mut stage, &config.os.wifi, true)?;
    apply_networks(&renderer, &mut stage, &mgmt, true)?;

    let mut doc = YipConfig::new("Harvester Configuration");
    doc.stages.insert(LIVE_STAGE.to_string(), vec![stage]);
    Ok(doc)
}
