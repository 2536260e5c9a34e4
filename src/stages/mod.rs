// file: src/stages/mod.rs
// version: 1.0.0
// guid: 3b9f1d2e-6a4c-4e8b-9d7f-1c2a3b4d5e6f

//! Stage documents consumed by the node configuration executor.
//!
//! A document is a set of named stages (`rootfs`, `initramfs`, `live`, ...),
//! each holding an ordered list of [`Stage`] steps. Every map is ordered so the
//! serialized output is stable.

pub mod cos;
pub mod network;
pub mod rancherd;
pub mod templates;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use cos::to_install_stage;
pub use rancherd::{generate_bootstrap_config, to_bootstrap_stage};

/// Fixed system login account configured on every node
pub const LOGIN_USER: &str = "rancher";

/// A complete stage document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YipConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub stages: BTreeMap<String, Vec<Stage>>,
}

impl YipConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: BTreeMap::new(),
        }
    }

    /// Render the document as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// One step of a stage
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sysctl: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ssh_authorized_keys: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<String, User>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub timesyncd: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Stage {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Configure SSH keys and the password hash of the login account
    pub fn set_login(&mut self, ssh_keys: &[String], password: &str) {
        if !ssh_keys.is_empty() {
            self.ssh_authorized_keys
                .insert(LOGIN_USER.to_string(), ssh_keys.to_vec());
        }
        if !password.is_empty() {
            self.users.insert(
                LOGIN_USER.to_string(),
                User {
                    passwd: password.to_string(),
                },
            );
        }
    }
}

/// A file to write
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub path: String,
    pub content: String,
    pub permissions: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub owner: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub group: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner_string: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encoding: String,
}

impl File {
    pub fn new(path: impl Into<String>, content: impl Into<String>, permissions: u32) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            permissions,
            ..Default::default()
        }
    }
}

/// A directory to create
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    pub path: String,
    pub permissions: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub owner: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub group: u32,
}

/// Account settings applied by the executor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub passwd: String,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}
