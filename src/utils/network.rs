// file: src/utils/network.rs
// version: 2.0.0
// guid: 9c8f2b1a-2d4e-4f0b-b1a7-3e6c5d4f2a90

//! Host network interface enumeration

use crate::error::{InstallerError, Result};
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// A network interface present on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInterface {
    pub name: String,
    /// Hardware (MAC) address, empty when the interface has none
    pub hw_addr: String,
    pub loopback: bool,
    /// First IPv4 address, if any
    pub ipv4: Option<Ipv4Addr>,
}

/// List the interfaces of this host, one entry per interface name
pub fn list_interfaces() -> Result<Vec<HostInterface>> {
    let interfaces = NetworkInterface::show()
        .map_err(|e| InstallerError::network(format!("Failed to get network interfaces: {}", e)))?;

    // some platforms report one entry per address
    let mut merged: BTreeMap<String, HostInterface> = BTreeMap::new();
    for iface in interfaces {
        let entry = merged.entry(iface.name.clone()).or_insert_with(|| HostInterface {
            name: iface.name.clone(),
            hw_addr: String::new(),
            loopback: iface.name == "lo",
            ipv4: None,
        });

        if let Some(mac) = iface.mac_addr.as_deref() {
            if entry.hw_addr.is_empty() && mac != "00:00:00:00:00:00" {
                entry.hw_addr = mac.to_string();
            }
        }

        for addr in &iface.addr {
            let ip = addr.ip();
            if ip.is_loopback() {
                entry.loopback = true;
            }
            if let IpAddr::V4(v4) = ip {
                if entry.ipv4.is_none() {
                    entry.ipv4 = Some(v4);
                }
            }
        }
    }

    debug!("Found {} network interfaces", merged.len());
    Ok(merged.into_values().collect())
}

/// Find an interface by name, falling back to its hardware address
pub fn lookup_interface<'a>(
    interfaces: &'a [HostInterface],
    name: &str,
    hw_addr: &str,
) -> Option<&'a HostInterface> {
    if !name.is_empty() {
        if let Some(found) = interfaces.iter().find(|i| i.name == name) {
            return Some(found);
        }
    }
    if !hw_addr.is_empty() {
        return interfaces
            .iter()
            .find(|i| !i.hw_addr.is_empty() && i.hw_addr.eq_ignore_ascii_case(hw_addr));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interfaces() -> Vec<HostInterface> {
        vec![
            HostInterface {
                name: "lo".to_string(),
                hw_addr: String::new(),
                loopback: true,
                ipv4: Some(Ipv4Addr::LOCALHOST),
            },
            HostInterface {
                name: "eth0".to_string(),
                hw_addr: "52:54:00:12:34:56".to_string(),
                loopback: false,
                ipv4: Some(Ipv4Addr::new(10, 0, 0, 5)),
            },
        ]
    }

    #[test]
    fn test_lookup_by_name_or_hw_addr() {
        let list = interfaces();
        assert_eq!(lookup_interface(&list, "eth0", "").unwrap().name, "eth0");
        assert_eq!(lookup_interface(&list, "", "52:54:00:12:34:56").unwrap().name, "eth0");
        assert_eq!(lookup_interface(&list, "", "52:54:00:12:34:56".to_uppercase().as_str()).unwrap().name, "eth0");
        assert!(lookup_interface(&list, "eth7", "").is_none());
        assert!(lookup_interface(&list, "", "").is_none());
    }

    #[test]
    fn test_list_interfaces_merges_by_name() {
        // host dependent; environments without interface access are skipped
        let Ok(list) = list_interfaces() else {
            return;
        };
        assert!(list.iter().all(|iface| !iface.name.is_empty()));
        let mut names: Vec<&str> = list.iter().map(|iface| iface.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), list.len());
    }
}
