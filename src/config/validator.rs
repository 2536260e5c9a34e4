// file: src/config/validator.rs
// version: 2.0.0
// guid: 8e2c4a6b-0d1f-4b3e-9a5c-7f8e9d0c1b2a

//! Configuration validation.
//!
//! Validation runs once, before any stage document is produced. It is split in a
//! mode-independent [`common_check`] and a pluggable, mode-aware
//! [`ConfigValidator`] so host lookups can be replaced in tests.

use super::{HarvesterConfig, InstallMode, Network, NetworkMethod};
use crate::error::{Result, ValidationError};
use crate::partition::persistent_partition_size_mib;
use crate::utils::network::lookup_interface;
use crate::utils::{HostInterface, HostInventory};
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Mode-aware validation capability
pub trait ConfigValidator {
    fn validate(&self, config: &HarvesterConfig) -> Result<()>;
}

/// Validate `config`: the common check, then `validator` unless upgrading
pub fn validate(config: &HarvesterConfig, validator: &dyn ConfigValidator) -> Result<()> {
    info!("Validating installer configuration (mode: {})", config.install.mode());

    common_check(config)?;
    if *config.install.mode() == InstallMode::Upgrade {
        debug!("Upgrade mode, skipping host checks");
        return Ok(());
    }
    validator.validate(config)?;

    info!("Configuration validation completed successfully");
    Ok(())
}

/// Checks that need nothing but the configuration itself
pub fn common_check(config: &HarvesterConfig) -> Result<()> {
    match config.install.mode() {
        InstallMode::Upgrade => return Ok(()),
        InstallMode::Create => {
            if !config.server_url.is_empty() {
                return Err(ValidationError::ModeCreateContainsServerUrl.into());
            }
        }
        InstallMode::Join => {
            if config.server_url.is_empty() {
                return Err(ValidationError::ModeJoinServerUrlNotSpecified.into());
            }
        }
        InstallMode::Unknown(mode) => return Err(ValidationError::UnknownMode(mode.clone()).into()),
    }

    if config.token.is_empty() {
        return Err(ValidationError::TokenNotSpecified.into());
    }

    if config.os.ssh_authorized_keys.is_empty() && config.os.password.is_empty() {
        return Err(ValidationError::NoCredentials.into());
    }

    if config.install.force_gpt && config.install.force_mbr {
        return Err(ValidationError::ConflictingPartitionTable.into());
    }

    Ok(())
}

/// Validator that performs no host checks
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl ConfigValidator for NoopValidator {
    fn validate(&self, _config: &HarvesterConfig) -> Result<()> {
        Ok(())
    }
}

/// Validator checking interfaces and disks against a host inventory
#[derive(Debug, Clone)]
pub struct HostValidator<I> {
    inventory: I,
}

impl<I: HostInventory> HostValidator<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }
}

impl<I: HostInventory> ConfigValidator for HostValidator<I> {
    fn validate(&self, config: &HarvesterConfig) -> Result<()> {
        let interfaces = self.inventory.interfaces()?;
        let install = &config.install;

        match config.management_network() {
            Some(mgmt) => {
                check_interface(&interfaces, mgmt)?;
                check_network_method(mgmt)?;
            }
            None if *install.mode() == InstallMode::Create => {
                return Err(ValidationError::MgmtInterfaceNotSpecified.into());
            }
            None => {}
        }

        if install.device.is_empty() {
            return Err(ValidationError::DeviceNotSpecified.into());
        }
        let disks = self.inventory.block_devices()?;
        let device = disks
            .iter()
            .find(|d| d.path == install.device)
            .ok_or_else(|| ValidationError::DeviceNotFound(install.device.clone()))?;
        let persistent_mib = persistent_partition_size_mib(
            device.size_bytes,
            &install.persistent_partition_size,
            install.skip_checks,
        )?;
        debug!("Persistent partition on {}: {} MiB", device.path, persistent_mib);

        if !install.data_disk.is_empty() {
            if install.data_disk == install.device {
                return Err(ValidationError::DataDiskIsInstallDevice(install.data_disk.clone()).into());
            }
            if !disks.iter().any(|d| d.path == install.data_disk) {
                return Err(ValidationError::DataDiskNotFound(install.data_disk.clone()).into());
            }
        }

        for network in &install.networks {
            check_interface(&interfaces, network)?;
            check_network_method(network)?;
        }

        if !install.vip.is_empty() {
            check_ipv4("vip", &install.vip)?;
        }

        Ok(())
    }
}

fn check_interface(interfaces: &[HostInterface], network: &Network) -> Result<()> {
    if !network.is_set() {
        return Err(ValidationError::InterfaceNotSpecified.into());
    }
    let found = lookup_interface(interfaces, &network.interface, &network.hw_addr)
        .ok_or_else(|| ValidationError::InterfaceNotFound(display_name(network)))?;
    if found.loopback {
        return Err(ValidationError::InterfaceIsLoopback(found.name.clone()).into());
    }
    Ok(())
}

/// Check the address settings a network's method requires
pub fn check_network_method(network: &Network) -> Result<()> {
    match &network.method {
        NetworkMethod::Dhcp => Ok(()),
        NetworkMethod::Static => {
            require_ipv4("ip", &network.ip)?;
            require_ipv4("subnetMask", &network.subnet_mask)?;
            require_ipv4("gateway", &network.gateway)?;
            if network.dns_nameservers.is_empty() {
                return Err(ValidationError::StaticFieldNotSpecified("dnsNameservers").into());
            }
            for dns in &network.dns_nameservers {
                check_ipv4("dnsNameservers", dns)?;
            }
            Ok(())
        }
        NetworkMethod::Unknown(method) => {
            Err(ValidationError::UnknownNetworkMethod(method.clone()).into())
        }
    }
}

fn require_ipv4(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::StaticFieldNotSpecified(field).into());
    }
    check_ipv4(field, value)
}

fn check_ipv4(field: &'static str, value: &str) -> Result<()> {
    value.parse::<Ipv4Addr>().map_err(|_| ValidationError::InvalidIpv4 {
        field,
        value: value.to_string(),
    })?;
    Ok(())
}

fn display_name(network: &Network) -> String {
    if network.interface.is_empty() {
        network.hw_addr.clone()
    } else {
        network.interface.clone()
    }
}

/// Fill in the missing name or hardware address of every referenced interface.
/// An interface that cannot be found on the host is an error.
pub fn resolve_interfaces(config: &mut HarvesterConfig, inventory: &dyn HostInventory) -> Result<()> {
    let interfaces = inventory.interfaces()?;

    let install = &mut config.install;
    let networks = std::iter::once(&mut install.management_interface)
        .filter(|n| n.is_set())
        .chain(install.networks.iter_mut());

    for network in networks {
        if !network.interface.is_empty() && !network.hw_addr.is_empty() {
            continue;
        }
        let found = lookup_interface(&interfaces, &network.interface, &network.hw_addr)
            .ok_or_else(|| ValidationError::InterfaceNotFound(display_name(network)))?;
        debug!("Resolved interface {} ({})", found.name, found.hw_addr);
        if network.interface.is_empty() {
            network.interface = found.name.clone();
        }
        if network.hw_addr.is_empty() {
            network.hw_addr = found.hw_addr.clone();
        }
    }

    Ok(())
}
