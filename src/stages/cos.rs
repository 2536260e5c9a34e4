// file: src/stages/cos.rs
// version: 1.0.0
// guid: 9a8b7c6d-5e4f-4321-8a0b-c1d2e3f4a5b6

//! OS install stage document

use super::network::{apply_networks, apply_wifi, collect_dns_servers, static_dns_command};
use super::rancherd::bootstrap_stage;
use super::templates::{TemplateRenderer, CANAL_CONFIG};
use super::{File, Stage, YipConfig};
use crate::config::{HarvesterConfig, InstallMode, WriteFile};
use crate::Result;
use serde_json::json;
use tracing::{info, warn};

pub const ROOTFS_STAGE: &str = "rootfs";
pub const INITRAMFS_STAGE: &str = "initramfs";

pub const LEGACY_NETWORK_CONFIG: &str = "/etc/sysconfig/network/ifcfg-eth0";
pub const RKE2_MANIFESTS_DIR: &str = "/var/lib/rancher/rke2/server/manifests";
pub const CANAL_CONFIG_FILE: &str = "/var/lib/rancher/rke2/server/manifests/rke2-canal-config.yaml";

/// Permissions used when a write-file entry carries none or an unparsable one
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

/// Build the stage document applied by the OS installer.
///
/// The result holds a `rootfs` stage removing the legacy network config and an
/// `initramfs` stage list: the cluster bootstrap step followed by the main
/// node configuration step.
pub fn to_install_stage(config: &HarvesterConfig) -> Result<YipConfig> {
    info!("Generating install stage document (mode: {})", config.install.mode());
    let mut config = config.clone();
    let renderer = TemplateRenderer::new()?;

    if let Some(mgmt) = config.management_network().cloned() {
        let present = config
            .install
            .networks
            .iter()
            .any(|n| n.interface == mgmt.interface);
        if !present {
            config.install.networks.push(mgmt);
        }
    }

    let mut pre = Stage::named("Remove legacy network config");
    pre.commands.push(format!("rm -f {}", LEGACY_NETWORK_CONFIG));

    let bootstrap = bootstrap_stage(&renderer, &config)?;

    let os = &config.os;
    let mut main = Stage::named("Harvester configuration");
    main.set_login(&os.ssh_authorized_keys, "");
    main.files.extend(os.write_files.iter().map(write_file));
    main.hostname = os.hostname.clone();
    main.modules = os.modules.clone();
    main.sysctl = os.sysctls.clone();
    if !os.ntp_servers.is_empty() {
        main.timesyncd.insert("NTP".to_string(), os.ntp_servers.join(" "));
    }

    let dns = collect_dns_servers(&os.dns_nameservers, &config.install.networks);
    if !dns.is_empty() {
        main.commands.push(static_dns_command(&dns));
    }

    apply_wifi(&renderer, &mut main, &os.wifi, false)?;
    apply_networks(&renderer, &mut main, &config.install.networks, false)?;

    if *config.install.mode() == InstallMode::Create {
        if let Some(mgmt) = config.management_network() {
            let canal = renderer.render(CANAL_CONFIG, &json!({ "interface": mgmt.interface }))?;
            main.files.push(File::new(CANAL_CONFIG_FILE, canal, 0o600));
        }
    }

    main.set_login(&[], &os.password);
    main.environment = os.environment.clone();

    let mut doc = YipConfig::new("Harvester Configuration");
    doc.stages.insert(ROOTFS_STAGE.to_string(), vec![pre]);
    doc.stages.insert(INITRAMFS_STAGE.to_string(), vec![bootstrap, main]);
    Ok(doc)
}

fn write_file(entry: &WriteFile) -> File {
    File {
        path: entry.path.clone(),
        content: entry.content.clone(),
        permissions: parse_permissions(&entry.path, &entry.raw_permissions),
        owner_string: entry.owner.clone(),
        encoding: entry.encoding.clone(),
        ..Default::default()
    }
}

/// Parse an octal permission string, falling back to [`DEFAULT_FILE_PERMISSIONS`]
pub fn parse_permissions(path: &str, raw: &str) -> u32 {
    if raw.is_empty() {
        return DEFAULT_FILE_PERMISSIONS;
    }
    match u32::from_str_radix(raw, 8) {
        Ok(mode) => mode,
        Err(e) => {
            warn!(
                "Invalid permissions {:?} for {}, using {:o}: {}",
                raw, path, DEFAULT_FILE_PERMISSIONS, e
            );
            DEFAULT_FILE_PERMISSIONS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use crate::config::{Network, NetworkMethod};
    use crate::error::InstallerError;
    use crate::stages::rancherd::RANCHERD_CONFIG_FILE;
    use crate::stages::LOGIN_USER;

    fn main_stage(doc: &YipConfig) -> &Stage {
        &doc.stages[INITRAMFS_STAGE][1]
    }

    fn paths(stage: &Stage) -> Vec<&str> {
        stage.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_stage_layout() {
        let doc = to_install_stage(&sample_config()).unwrap();
        let keys: Vec<&str> = doc.stages.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![INITRAMFS_STAGE, ROOTFS_STAGE]);

        assert_eq!(doc.stages[ROOTFS_STAGE][0].commands, vec!["rm -f /etc/sysconfig/network/ifcfg-eth0"]);
        let initramfs = &doc.stages[INITRAMFS_STAGE];
        assert_eq!(initramfs.len(), 2);
        assert!(initramfs[0].files.iter().any(|f| f.path == RANCHERD_CONFIG_FILE));
    }

    #[test]
    fn test_main_stage_contents() {
        let doc = to_install_stage(&sample_config()).unwrap();
        let main = main_stage(&doc);

        assert_eq!(main.hostname, "node-0");
        assert_eq!(main.ssh_authorized_keys[LOGIN_USER].len(), 1);
        assert_eq!(main.users[LOGIN_USER].passwd, "$6$salt$hash");
        assert_eq!(main.timesyncd["NTP"], "0.suse.pool.ntp.org 1.suse.pool.ntp.org");
        assert_eq!(main.sysctl.get("kernel.printk").map(String::as_str), Some("4 4 1 7"));
        assert_eq!(main.environment["HTTP_PROXY"], "http://proxy:3128");
        assert_eq!(main.commands.len(), 1);
        assert!(main.commands[0].contains("NETCONFIG_DNS_STATIC_SERVERS=\"8.8.8.8\""));

        let files = paths(main);
        assert!(files.contains(&"/etc/sysconfig/network/ifcfg-wlan0"));
        assert!(files.contains(&"/etc/sysconfig/network/ifcfg-eth0"));
        assert!(files.contains(&CANAL_CONFIG_FILE));
    }

    #[test]
    fn test_management_network_not_duplicated() {
        let mut config = sample_config();
        config.install.networks = vec![Network::dhcp("eth0"), Network::dhcp("eth1")];
        let doc = to_install_stage(&config).unwrap();
        let files = paths(main_stage(&doc));
        let eth0 = files.iter().filter(|p| **p == "/etc/sysconfig/network/ifcfg-eth0").count();
        assert_eq!(eth0, 1);
        assert!(files.contains(&"/etc/sysconfig/network/ifcfg-eth1"));
    }

    #[test]
    fn test_unresolved_management_interface_is_an_error() {
        let mut config = sample_config();
        config.install.management_interface = Network {
            hw_addr: "52:54:00:12:34:56".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            to_install_stage(&config),
            Err(InstallerError::UnresolvedInterface(hw)) if hw == "52:54:00:12:34:56"
        ));
    }

    #[test]
    fn test_join_mode_skips_canal() {
        let mut config = sample_config();
        config.install.set_mode(InstallMode::Join);
        config.server_url = "https://10.0.0.1".to_string();
        let doc = to_install_stage(&config).unwrap();
        assert!(!paths(main_stage(&doc)).contains(&CANAL_CONFIG_FILE));
    }

    #[test]
    fn test_canal_interface() {
        let doc = to_install_stage(&sample_config()).unwrap();
        let canal = main_stage(&doc)
            .files
            .iter()
            .find(|f| f.path == CANAL_CONFIG_FILE)
            .unwrap();
        assert!(canal.content.contains("name: rke2-canal"));
        assert!(canal.content.contains("iface: \"eth0\""));
    }

    #[test]
    fn test_static_dns_merged() {
        let mut config = sample_config();
        config.install.networks = vec![Network {
            interface: "eth1".to_string(),
            method: NetworkMethod::Static,
            ip: "10.1.0.5".to_string(),
            subnet_mask: "255.255.0.0".to_string(),
            gateway: "10.1.0.1".to_string(),
            dns_nameservers: vec!["10.1.0.1".to_string(), "8.8.8.8".to_string()],
            ..Default::default()
        }];
        let doc = to_install_stage(&config).unwrap();
        assert!(main_stage(&doc).commands[0].contains("\"8.8.8.8 10.1.0.1\""));
    }

    #[test]
    fn test_write_files_permissions() {
        let mut config = sample_config();
        config.os.write_files = vec![
            WriteFile {
                path: "/etc/a".to_string(),
                content: "a".to_string(),
                raw_permissions: "0644".to_string(),
                owner: "root:root".to_string(),
                ..Default::default()
            },
            WriteFile {
                path: "/etc/b".to_string(),
                content: "b".to_string(),
                raw_permissions: "rw-r--r--".to_string(),
                ..Default::default()
            },
        ];
        let doc = to_install_stage(&config).unwrap();
        let main = main_stage(&doc);
        assert_eq!(main.files[0].permissions, 0o644);
        assert_eq!(main.files[0].owner_string, "root:root");
        assert_eq!(main.files[1].permissions, 0o600);
    }

    #[test]
    fn test_parse_permissions() {
        assert_eq!(parse_permissions("/x", "755"), 0o755);
        assert_eq!(parse_permissions("/x", "0640"), 0o640);
        assert_eq!(parse_permissions("/x", ""), DEFAULT_FILE_PERMISSIONS);
        assert_eq!(parse_permissions("/x", "0999"), DEFAULT_FILE_PERMISSIONS);
    }

    #[test]
    fn test_deterministic_and_input_untouched() {
        let config = sample_config();
        let before = config.clone();
        let first = to_install_stage(&config).unwrap().to_yaml().unwrap();
        let second = to_install_stage(&config).unwrap().to_yaml().unwrap();
        assert_eq!(first, second);
        assert_eq!(config.install.networks, before.install.networks);
        assert!(config.install.networks.is_empty());
    }
}
