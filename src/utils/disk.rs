// file: src/utils/disk.rs
// version: 2.0.0
// guid: 2f6b0e8d-7a0c-4d37-9d0a-6e3b1c9f8a42

//! Block device enumeration through `lsblk`

use crate::error::{InstallerError, Result};
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

/// A whole disk present on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Device path such as `/dev/sda`
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    size: LsblkSize,
    #[serde(rename = "type")]
    kind: String,
}

/// Older lsblk versions print numbers as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LsblkSize {
    Number(u64),
    Text(String),
}

impl LsblkSize {
    fn bytes(&self) -> Option<u64> {
        match self {
            LsblkSize::Number(n) => Some(*n),
            LsblkSize::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// List the whole disks of this host
pub fn list_block_devices() -> Result<Vec<BlockDevice>> {
    let output = Command::new("lsblk")
        .args(["-J", "-b", "-d", "-p", "-o", "NAME,SIZE,TYPE"])
        .output()
        .map_err(|e| InstallerError::system(format!("Failed to execute lsblk command: {}", e)))?;

    if !output.status.success() {
        return Err(InstallerError::system(format!(
            "lsblk command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let devices = parse_lsblk(&String::from_utf8_lossy(&output.stdout))?;
    debug!("Found {} block devices", devices.len());
    Ok(devices)
}

fn parse_lsblk(json: &str) -> Result<Vec<BlockDevice>> {
    let output: LsblkOutput = serde_json::from_str(json)?;
    Ok(output
        .blockdevices
        .into_iter()
        .filter(|d| d.kind == "disk")
        .filter_map(|d| {
            d.size.bytes().map(|size_bytes| BlockDevice {
                path: d.name,
                size_bytes,
            })
        })
        .collect())
}
