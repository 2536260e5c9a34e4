// file: src/config/mod.rs
// version: 2.0.0
// guid: 6d7f1f5e-7c1e-4c61-8a4b-5d2d8f6c0e11

//! Installer configuration model.
//!
//! A [`HarvesterConfig`] is assembled once per install run (from a YAML document,
//! the kernel command line or both), validated once, and then handed read-only to
//! the stage transformers. Field names follow the camelCase schema of the config
//! file; unknown fields are ignored and missing ones take their defaults.

pub mod cmdline;
pub mod loader;
pub mod validator;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Replacement for secrets in any rendering meant for humans or logs
pub const SECRET_MASK: &str = "*****";

/// What this install run does to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum InstallMode {
    /// Found a new cluster
    #[default]
    Create,
    /// Join an existing cluster
    Join,
    /// Upgrade an installed node
    Upgrade,
    /// Anything else; rejected by validation
    Unknown(String),
}

impl InstallMode {
    pub fn as_str(&self) -> &str {
        match self {
            InstallMode::Create => "create",
            InstallMode::Join => "join",
            InstallMode::Upgrade => "upgrade",
            InstallMode::Unknown(s) => s,
        }
    }
}

impl From<String> for InstallMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "create" => InstallMode::Create,
            "join" => InstallMode::Join,
            "upgrade" => InstallMode::Upgrade,
            _ => InstallMode::Unknown(s),
        }
    }
}

impl From<InstallMode> for String {
    fn from(mode: InstallMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an interface gets its address. An empty method means DHCP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum NetworkMethod {
    #[default]
    Dhcp,
    Static,
    Unknown(String),
}

impl NetworkMethod {
    pub fn as_str(&self) -> &str {
        match self {
            NetworkMethod::Dhcp => "dhcp",
            NetworkMethod::Static => "static",
            NetworkMethod::Unknown(s) => s,
        }
    }
}

impl From<String> for NetworkMethod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" | "dhcp" => NetworkMethod::Dhcp,
            "static" => NetworkMethod::Static,
            _ => NetworkMethod::Unknown(s),
        }
    }
}

impl From<NetworkMethod> for String {
    fn from(method: NetworkMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for NetworkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root installer configuration
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvesterConfig {
    /// Cluster to join; empty when founding a new cluster
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_url: String,
    /// Cluster join token (secret)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Kubernetes runtime version; the build-time default applies when empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub runtime_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rancher_version: String,
    pub os: OsConfig,
    pub install: InstallConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub webhooks: Vec<Webhook>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub addons: BTreeMap<String, Addon>,
}

/// Operating system settings applied on first boot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub write_files: Vec<WriteFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sysctls: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ntp_servers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wifi: Vec<Wifi>,
    /// Password hash for the login account (secret, hashed at capture time)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Node labels, validated as Kubernetes labels
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Disk, network and mode settings of the install run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallConfig {
    /// Unset means [`InstallMode::Create`]; see [`InstallConfig::mode`]
    #[serde(rename = "mode", skip_serializing_if = "Option::is_none")]
    pub raw_mode: Option<InstallMode>,
    /// Target disk path
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device: String,
    /// Network carrying cluster traffic
    pub management_interface: Network,
    #[serde(
        deserialize_with = "deserialize_networks",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub networks: Vec<Network>,
    /// Cluster virtual IP
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vip_mode: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vip_hw_addr: String,
    pub force_efi: bool,
    pub force_mbr: bool,
    pub force_gpt: bool,
    pub wipe_disks: bool,
    pub no_format: bool,
    /// `<N>Mi` or `<N>Gi`; empty lets the sizing policy decide
    #[serde(skip_serializing_if = "String::is_empty")]
    pub persistent_partition_size: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_disk: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iso_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tty: String,
    pub automatic: bool,
    pub skip_checks: bool,
    pub silent: bool,
    pub power_off: bool,
    pub debug: bool,
}

/// A network interface configuration. The interface may be named or identified by
/// its hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub interface: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hw_addr: String,
    pub method: NetworkMethod,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subnet_mask: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_nameservers: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub mtu: u32,
}

impl InstallConfig {
    /// Effective install mode
    pub fn mode(&self) -> &InstallMode {
        static DEFAULT_MODE: InstallMode = InstallMode::Create;
        self.raw_mode.as_ref().unwrap_or(&DEFAULT_MODE)
    }

    pub fn set_mode(&mut self, mode: InstallMode) {
        self.raw_mode = Some(mode);
    }
}

impl Network {
    /// A DHCP network on `interface`
    pub fn dhcp(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Default::default()
        }
    }

    /// Whether the entry references an interface at all
    pub fn is_set(&self) -> bool {
        !self.interface.is_empty() || !self.hw_addr.is_empty()
    }
}

/// A file written on first boot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteFile {
    pub path: String,
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Octal permission string such as `0644`
    #[serde(rename = "permissions", skip_serializing_if = "String::is_empty")]
    pub raw_permissions: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encoding: String,
}

/// A wireless network to join
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Wifi {
    pub name: String,
    /// Pre-shared key (secret)
    pub passphrase: String,
}

impl fmt::Debug for Wifi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wifi")
            .field("name", &self.name)
            .field("passphrase", &SECRET_MASK)
            .finish()
    }
}

/// Webhook fired on install events
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Webhook {
    /// STARTED, SUCCEEDED or FAILED
    pub event: String,
    pub method: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// URL template
    pub url: String,
    /// Body template
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payload: String,
    pub insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

/// Cluster add-on toggle applied when the cluster is founded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Addon {
    pub enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub values_content: String,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Accept `networks` either as a list or as a map keyed by interface name
fn deserialize_networks<'de, D>(deserializer: D) -> std::result::Result<Vec<Network>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Networks {
        List(Vec<Network>),
        Map(IndexMap<String, Network>),
    }

    Ok(match Option::<Networks>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Networks::List(list)) => list,
        Some(Networks::Map(map)) => map
            .into_iter()
            .map(|(name, mut network)| {
                if network.interface.is_empty() {
                    network.interface = name;
                }
                network
            })
            .collect(),
    })
}

impl HarvesterConfig {
    /// Copy with every secret replaced by [`SECRET_MASK`]
    pub fn sanitized(&self) -> Self {
        let mut copy = self.clone();
        if !copy.os.password.is_empty() {
            copy.os.password = SECRET_MASK.to_string();
        }
        if !copy.token.is_empty() {
            copy.token = SECRET_MASK.to_string();
        }
        for wifi in copy.os.wifi.iter_mut() {
            if !wifi.passphrase.is_empty() {
                wifi.passphrase = SECRET_MASK.to_string();
            }
        }
        copy
    }

    /// The management network, if one is configured
    pub fn management_network(&self) -> Option<&Network> {
        Some(&self.install.management_interface).filter(|n| n.is_set())
    }

    /// Layer `other` underneath `self`: empty scalars are filled, flags are OR-ed,
    /// lists are appended and missing map entries are added.
    pub fn merge_from(&mut self, other: &HarvesterConfig) {
        fill(&mut self.server_url, &other.server_url);
        fill(&mut self.token, &other.token);
        fill(&mut self.runtime_version, &other.runtime_version);
        fill(&mut self.rancher_version, &other.rancher_version);

        let os = &mut self.os;
        fill(&mut os.hostname, &other.os.hostname);
        fill(&mut os.password, &other.os.password);
        os.ssh_authorized_keys.extend(other.os.ssh_authorized_keys.iter().cloned());
        os.write_files.extend(other.os.write_files.iter().cloned());
        os.modules.extend(other.os.modules.iter().cloned());
        os.ntp_servers.extend(other.os.ntp_servers.iter().cloned());
        os.dns_nameservers.extend(other.os.dns_nameservers.iter().cloned());
        os.wifi.extend(other.os.wifi.iter().cloned());
        fill_map(&mut os.sysctls, &other.os.sysctls);
        fill_map(&mut os.environment, &other.os.environment);
        fill_map(&mut os.labels, &other.os.labels);

        let install = &mut self.install;
        if install.raw_mode.is_none() {
            install.raw_mode = other.install.raw_mode.clone();
        }
        fill(&mut install.device, &other.install.device);
        if !install.management_interface.is_set() {
            install.management_interface = other.install.management_interface.clone();
        }
        install.networks.extend(other.install.networks.iter().cloned());
        fill(&mut install.vip, &other.install.vip);
        fill(&mut install.vip_mode, &other.install.vip_mode);
        fill(&mut install.vip_hw_addr, &other.install.vip_hw_addr);
        install.force_efi |= other.install.force_efi;
        install.force_mbr |= other.install.force_mbr;
        install.force_gpt |= other.install.force_gpt;
        install.wipe_disks |= other.install.wipe_disks;
        install.no_format |= other.install.no_format;
        fill(&mut install.persistent_partition_size, &other.install.persistent_partition_size);
        fill(&mut install.data_disk, &other.install.data_disk);
        fill(&mut install.config_url, &other.install.config_url);
        fill(&mut install.iso_url, &other.install.iso_url);
        fill(&mut install.tty, &other.install.tty);
        install.automatic |= other.install.automatic;
        install.skip_checks |= other.install.skip_checks;
        install.silent |= other.install.silent;
        install.power_off |= other.install.power_off;
        install.debug |= other.install.debug;

        self.webhooks.extend(other.webhooks.iter().cloned());
        for (name, addon) in &other.addons {
            self.addons.entry(name.clone()).or_insert_with(|| addon.clone());
        }
    }
}

fn fill(target: &mut String, source: &str) {
    if target.is_empty() {
        *target = source.to_string();
    }
}

fn fill_map(target: &mut BTreeMap<String, String>, source: &BTreeMap<String, String>) {
    for (k, v) in source {
        target.entry(k.clone()).or_insert_with(|| v.clone());
    }
}

impl fmt::Display for HarvesterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yaml = serde_yaml::to_string(&self.sanitized()).map_err(|_| fmt::Error)?;
        f.write_str(&yaml)
    }
}

impl fmt::Debug for HarvesterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
