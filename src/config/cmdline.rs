// file: src/config/cmdline.rs
// version: 1.0.0
// guid: 0f3a7f25-3a8e-4a5e-9a53-8a0f0e2f4c71

//! Kernel command line configuration source.
//!
//! Parameters look like `harvester.install.device=/dev/sda`. Every recognised key
//! has a fixed coercion: flags accept a bare token (meaning `true`), list fields
//! accumulate repeated keys and comma separated values, map fields take the rest of
//! the key as the entry name. Key segments are matched without regard to case,
//! `_` or `-`, so `ssh_authorized_keys` and `sshAuthorizedKeys` are the same field.

use super::{HarvesterConfig, Network};
use crate::error::{InstallerError, Result};
use tracing::debug;

/// Prefix of the parameters this installer reads
pub const CMDLINE_PREFIX: &str = "harvester.";

/// Build a configuration from kernel command line text
pub fn parse_cmdline(cmdline: &str) -> Result<HarvesterConfig> {
    let mut config = HarvesterConfig::default();

    for token in split_cmdline(cmdline) {
        let Some(param) = token.strip_prefix(CMDLINE_PREFIX) else {
            continue;
        };
        let (key, value) = match param.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (param, None),
        };
        apply_param(&mut config, key, value)?;
    }

    Ok(config)
}

/// Split on whitespace, keeping double-quoted runs together
fn split_cmdline(cmdline: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in cmdline.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn normalize(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn apply_param(config: &mut HarvesterConfig, key: &str, value: Option<&str>) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    let head: Vec<String> = segments.iter().take(2).map(|s| normalize(s)).collect();
    let head: Vec<&str> = head.iter().map(String::as_str).collect();

    // map fields keep the remainder of the key verbatim
    if segments.len() > 2 {
        let entry = segments[2..].join(".");
        let target = match head.as_slice() {
            ["os", "sysctls"] => Some(&mut config.os.sysctls),
            ["os", "environment"] => Some(&mut config.os.environment),
            ["os", "labels"] => Some(&mut config.os.labels),
            _ => None,
        };
        if let Some(map) = target {
            map.insert(entry, require(key, value)?.to_string());
            return Ok(());
        }
        if head.as_slice() == ["install", "managementinterface"] {
            return apply_network_param(
                &mut config.install.management_interface,
                key,
                &normalize(&entry),
                value,
            );
        }
    }

    let os = &mut config.os;
    let install = &mut config.install;
    match head.as_slice() {
        ["serverurl"] => config.server_url = require(key, value)?.to_string(),
        ["token"] => config.token = require(key, value)?.to_string(),
        ["runtimeversion"] => config.runtime_version = require(key, value)?.to_string(),
        ["rancherversion"] => config.rancher_version = require(key, value)?.to_string(),

        ["os", "hostname"] => os.hostname = require(key, value)?.to_string(),
        ["os", "password"] => os.password = require(key, value)?.to_string(),
        ["os", "sshauthorizedkeys"] => push_list(&mut os.ssh_authorized_keys, key, value)?,
        ["os", "ntpservers"] => push_list(&mut os.ntp_servers, key, value)?,
        ["os", "dnsnameservers"] => push_list(&mut os.dns_nameservers, key, value)?,
        ["os", "modules"] => push_list(&mut os.modules, key, value)?,

        ["install", "mode"] => install.set_mode(require(key, value)?.to_string().into()),
        ["install", "device"] => install.device = require(key, value)?.to_string(),
        ["install", "mgmtinterface"] => {
            install.management_interface.interface = require(key, value)?.to_string()
        }
        ["install", "vip"] => install.vip = require(key, value)?.to_string(),
        ["install", "vipmode"] => install.vip_mode = require(key, value)?.to_string(),
        ["install", "viphwaddr"] => install.vip_hw_addr = require(key, value)?.to_string(),
        ["install", "persistentpartitionsize"] => {
            install.persistent_partition_size = require(key, value)?.to_string()
        }
        ["install", "datadisk"] => install.data_disk = require(key, value)?.to_string(),
        ["install", "configurl"] => install.config_url = require(key, value)?.to_string(),
        ["install", "isourl"] => install.iso_url = require(key, value)?.to_string(),
        ["install", "tty"] => install.tty = require(key, value)?.to_string(),

        ["install", "forceefi"] => install.force_efi = parse_flag(key, value)?,
        ["install", "forcembr"] => install.force_mbr = parse_flag(key, value)?,
        ["install", "forcegpt"] => install.force_gpt = parse_flag(key, value)?,
        ["install", "wipedisks"] => install.wipe_disks = parse_flag(key, value)?,
        ["install", "noformat"] => install.no_format = parse_flag(key, value)?,
        ["install", "automatic"] => install.automatic = parse_flag(key, value)?,
        ["install", "skipchecks"] => install.skip_checks = parse_flag(key, value)?,
        ["install", "silent"] => install.silent = parse_flag(key, value)?,
        ["install", "poweroff"] => install.power_off = parse_flag(key, value)?,
        ["install", "debug"] => install.debug = parse_flag(key, value)?,

        _ => debug!("Ignoring unknown kernel parameter {}{}", CMDLINE_PREFIX, key),
    }

    Ok(())
}

fn apply_network_param(
    network: &mut Network,
    key: &str,
    field: &str,
    value: Option<&str>,
) -> Result<()> {
    match field {
        "interface" => network.interface = require(key, value)?.to_string(),
        "hwaddr" => network.hw_addr = require(key, value)?.to_string(),
        "method" => network.method = require(key, value)?.to_string().into(),
        "ip" => network.ip = require(key, value)?.to_string(),
        "subnetmask" => network.subnet_mask = require(key, value)?.to_string(),
        "gateway" => network.gateway = require(key, value)?.to_string(),
        "dnsnameservers" => push_list(&mut network.dns_nameservers, key, value)?,
        "mtu" => {
            let raw = require(key, value)?;
            network.mtu = raw
                .parse()
                .map_err(|_| InstallerError::config(format!("invalid MTU for {}: {}", key, raw)))?;
        }
        _ => debug!("Ignoring unknown kernel parameter {}{}", CMDLINE_PREFIX, key),
    }
    Ok(())
}

fn require<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str> {
    value.ok_or_else(|| InstallerError::config(format!("kernel parameter {}{} requires a value", CMDLINE_PREFIX, key)))
}

fn parse_flag(key: &str, value: Option<&str>) -> Result<bool> {
    let Some(raw) = value else {
        return Ok(true);
    };
    match raw.to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(InstallerError::config(format!(
            "kernel parameter {}{} expects a boolean, got {:?}",
            CMDLINE_PREFIX, key, raw
        ))),
    }
}

fn push_list(list: &mut Vec<String>, key: &str, value: Option<&str>) -> Result<()> {
    let raw = require(key, value)?;
    list.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
    Ok(())
}
