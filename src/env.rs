// file: src/env.rs
// version: 1.0.0
// guid: 6e5d4c3b-2a19-4807-b6f5-e4d3c2b1a098

//! Flattening of configuration records into `PREFIX_KEY=value` environment
//! variables for the external installer process

use crate::config::HarvesterConfig;
use crate::error::InstallerError;
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// Prefix of the variables handed to the OS installer
pub const INSTALL_ENV_PREFIX: &str = "HARVESTER_";

/// Flatten a struct-like value into environment variable assignments.
///
/// Keys are the serialized field names converted to SCREAMING_SNAKE_CASE. Nested
/// records recurse with the parent key as prefix, lists are comma-joined and
/// null values are skipped.
pub fn to_env<T: Serialize + ?Sized>(prefix: &str, value: &T) -> Result<Vec<String>> {
    let value = serde_json::to_value(value)?;
    if !value.is_object() {
        return Err(InstallerError::NotAStruct(kind(&value).to_string()));
    }

    let mut env = Vec::new();
    flatten(prefix, &value, &mut env);
    Ok(env)
}

fn flatten(prefix: &str, value: &Value, env: &mut Vec<String>) {
    let Value::Object(fields) = value else {
        return;
    };
    for (key, field) in fields {
        let name = format!("{}{}", prefix, camel_to_screaming_snake(key));
        match field {
            Value::Null => {}
            Value::Object(_) => flatten(&format!("{}_", name), field, env),
            other => env.push(format!("{}={}", name, scalar(other))),
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `portNumber` becomes `PORT_NUMBER`
pub fn camel_to_screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase() {
            if let Some(p) = prev {
                if p.is_lowercase() || p.is_ascii_digit() {
                    out.push('_');
                }
            }
        }
        out.extend(c.to_uppercase());
        prev = Some(c);
    }
    out
}

/// Install settings exported to the OS installer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallEnv<'a> {
    mode: &'a str,
    device: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    data_disk: &'a str,
    force_efi: bool,
    force_mbr: bool,
    force_gpt: bool,
    wipe_disks: bool,
    no_format: bool,
    #[serde(skip_serializing_if = "is_empty")]
    persistent_partition_size: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    iso_url: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    tty: &'a str,
    silent: bool,
    power_off: bool,
    debug: bool,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

/// Environment for the external OS installer, prefixed with `HARVESTER_`
pub fn install_env(config: &HarvesterConfig) -> Result<Vec<String>> {
    let install = &config.install;
    let projection = InstallEnv {
        mode: install.mode().as_str(),
        device: &install.device,
        data_disk: &install.data_disk,
        force_efi: install.force_efi,
        force_mbr: install.force_mbr,
        force_gpt: install.force_gpt,
        wipe_disks: install.wipe_disks,
        no_format: install.no_format,
        persistent_partition_size: &install.persistent_partition_size,
        iso_url: &install.iso_url,
        tty: &install.tty,
        silent: install.silent,
        power_off: install.power_off,
        debug: install.debug,
    };
    to_env(INSTALL_ENV_PREFIX, &projection)
}
