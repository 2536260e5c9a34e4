// file: src/stages/network.rs
// version: 1.0.0
// guid: 5a6b7c8d-9e0f-4a1b-8c2d-3e4f5a6b7c8d

//! Wicked network configuration files and DNS settings

use super::templates::{TemplateRenderer, IFCFG_DHCP, IFCFG_STATIC, IFCFG_WLAN, IFROUTE};
use super::{File, Stage};
use crate::config::{Network, NetworkMethod, Wifi};
use crate::error::InstallerError;
use crate::Result;
use serde_json::json;
use tracing::debug;

pub const SYSCONFIG_NETWORK_DIR: &str = "/etc/sysconfig/network";
pub const NETWORK_CONFIG_FILE: &str = "/etc/sysconfig/network/config";

const NETWORK_FILE_PERMISSIONS: u32 = 0o600;

/// Files configuring one network interface. The interface must already be
/// resolved to a name; a network known only by hardware address is an error.
pub fn network_files(renderer: &TemplateRenderer, network: &Network) -> Result<Vec<File>> {
    let iface = &network.interface;
    if iface.is_empty() {
        return Err(InstallerError::UnresolvedInterface(network.hw_addr.clone()));
    }
    let mut files = Vec::new();

    match &network.method {
        NetworkMethod::Dhcp => {
            let content = renderer.render(IFCFG_DHCP, network)?;
            files.push(File::new(ifcfg_path(iface), content, NETWORK_FILE_PERMISSIONS));
        }
        NetworkMethod::Static => {
            let content = renderer.render(IFCFG_STATIC, network)?;
            files.push(File::new(ifcfg_path(iface), content, NETWORK_FILE_PERMISSIONS));
            let route = renderer.render(IFROUTE, network)?;
            files.push(File::new(
                format!("{}/ifroute-{}", SYSCONFIG_NETWORK_DIR, iface),
                route,
                NETWORK_FILE_PERMISSIONS,
            ));
        }
        NetworkMethod::Unknown(method) => {
            return Err(InstallerError::UnsupportedNetworkMethod(method.clone()));
        }
    }

    Ok(files)
}

/// Add network configuration for `networks` to `stage`, in list order.
/// With `run` set, the interfaces are reloaded immediately.
pub fn apply_networks(
    renderer: &TemplateRenderer,
    stage: &mut Stage,
    networks: &[Network],
    run: bool,
) -> Result<()> {
    for network in networks {
        debug!("Rendering {} network config for {}", network.method, network.interface);
        stage.files.extend(network_files(renderer, network)?);
        if run {
            stage.commands.push(format!("wicked ifreload {}", network.interface));
        }
    }
    Ok(())
}

/// Add one `wlan<N>` interface per wifi entry, in list order
pub fn apply_wifi(renderer: &TemplateRenderer, stage: &mut Stage, wifi: &[Wifi], run: bool) -> Result<()> {
    for (index, entry) in wifi.iter().enumerate() {
        let iface = format!("wlan{}", index);
        let content = renderer.render(
            IFCFG_WLAN,
            &json!({"name": entry.name, "passphrase": entry.passphrase}),
        )?;
        stage.files.push(File::new(ifcfg_path(&iface), content, NETWORK_FILE_PERMISSIONS));
        if run {
            stage.commands.push(format!("wicked ifreload {}", iface));
        }
    }
    Ok(())
}

/// Command rewriting the static DNS servers of the system network config
pub fn static_dns_command(servers: &[String]) -> String {
    format!(
        "sed -i 's/^NETCONFIG_DNS_STATIC_SERVERS.*/NETCONFIG_DNS_STATIC_SERVERS=\"{}\"/' {}",
        servers.join(" "),
        NETWORK_CONFIG_FILE
    )
}

/// OS DNS servers followed by those of static networks, without duplicates
pub fn collect_dns_servers(os_servers: &[String], networks: &[Network]) -> Vec<String> {
    let statics = networks
        .iter()
        .filter(|n| n.method == NetworkMethod::Static)
        .flat_map(|n| n.dns_nameservers.iter());

    let mut servers: Vec<String> = Vec::new();
    for server in os_servers.iter().chain(statics) {
        if !servers.contains(server) {
            servers.push(server.clone());
        }
    }
    servers
}

fn ifcfg_path(iface: &str) -> String {
    format!("{}/ifcfg-{}", SYSCONFIG_NETWORK_DIR, iface)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_network() -> Network {
        Network {
            interface: "eth1".to_string(),
            method: NetworkMethod::Static,
            ip: "192.168.1.10".to_string(),
            subnet_mask: "255.255.255.0".to_string(),
            gateway: "192.168.1.1".to_string(),
            dns_nameservers: vec!["192.168.1.1".to_string(), "8.8.8.8".to_string()],
            mtu: 9000,
            ..Default::default()
        }
    }

    #[test]
    fn test_dhcp_files() {
        let renderer = TemplateRenderer::new().unwrap();
        let files = network_files(&renderer, &Network::dhcp("eth0")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "/etc/sysconfig/network/ifcfg-eth0");
        assert_eq!(files[0].permissions, 0o600);
        assert!(files[0].content.contains("BOOTPROTO='dhcp'"));
        assert!(!files[0].content.contains("MTU"));
    }

    #[test]
    fn test_static_files() {
        let renderer = TemplateRenderer::new().unwrap();
        let files = network_files(&renderer, &static_network()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].content.contains("IPADDR='192.168.1.10'"));
        assert!(files[0].content.contains("NETMASK='255.255.255.0'"));
        assert!(files[0].content.contains("MTU=9000"));
        assert_eq!(files[1].path, "/etc/sysconfig/network/ifroute-eth1");
        assert_eq!(files[1].content.trim(), "default 192.168.1.1 - eth1");
    }

    #[test]
    fn test_unknown_method() {
        let renderer = TemplateRenderer::new().unwrap();
        let network = Network {
            interface: "eth0".to_string(),
            method: NetworkMethod::Unknown("ppp".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            network_files(&renderer, &network),
            Err(InstallerError::UnsupportedNetworkMethod(m)) if m == "ppp"
        ));
    }

    #[test]
    fn test_unresolved_interface() {
        let renderer = TemplateRenderer::new().unwrap();
        let network = Network {
            hw_addr: "52:54:00:12:34:56".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            network_files(&renderer, &network),
            Err(InstallerError::UnresolvedInterface(hw)) if hw == "52:54:00:12:34:56"
        ));
    }

    #[test]
    fn test_apply_networks_run() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut stage = Stage::default();
        apply_networks(&renderer, &mut stage, &[Network::dhcp("eth0"), static_network()], true).unwrap();
        assert_eq!(stage.files.len(), 3);
        assert_eq!(stage.commands, vec!["wicked ifreload eth0", "wicked ifreload eth1"]);

        let mut stage = Stage::default();
        apply_networks(&renderer, &mut stage, &[Network::dhcp("eth0")], false).unwrap();
        assert!(stage.commands.is_empty());
    }

    #[test]
    fn test_apply_wifi() {
        let renderer = TemplateRenderer::new().unwrap();
        let wifi = vec![
            Wifi { name: "first".to_string(), passphrase: "one".to_string() },
            Wifi { name: "second".to_string(), passphrase: "two".to_string() },
        ];
        let mut stage = Stage::default();
        apply_wifi(&renderer, &mut stage, &wifi, true).unwrap();

        assert_eq!(stage.files[0].path, "/etc/sysconfig/network/ifcfg-wlan0");
        assert!(stage.files[0].content.contains("WIRELESS_ESSID=\"first\""));
        assert_eq!(stage.files[1].path, "/etc/sysconfig/network/ifcfg-wlan1");
        assert!(stage.files[1].content.contains("WIRELESS_WPA_PSK=\"two\""));
        assert_eq!(stage.commands, vec!["wicked ifreload wlan0", "wicked ifreload wlan1"]);
    }

    #[test]
    fn test_static_dns_command() {
        let cmd = static_dns_command(&["1.1.1.1".to_string(), "8.8.8.8".to_string()]);
        assert_eq!(
            cmd,
            "sed -i 's/^NETCONFIG_DNS_STATIC_SERVERS.*/NETCONFIG_DNS_STATIC_SERVERS=\"1.1.1.1 8.8.8.8\"/' /etc/sysconfig/network/config"
        );
    }

    #[test]
    fn test_collect_dns_servers() {
        let servers = collect_dns_servers(
            &["8.8.8.8".to_string()],
            &[Network::dhcp("eth0"), static_network()],
        );
        assert_eq!(servers, vec!["8.8.8.8", "192.168.1.1"]);
    }
}
