// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb5

//! # HCI Installer
//!
//! Configuration engine for the HCI node installer. It validates the installer
//! configuration, sizes the persistent partition and renders the stage documents
//! applied by the OS installer and the node configuration executor.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod kubelet;
pub mod logging;
pub mod partition;
pub mod settings;
pub mod stages;
pub mod utils;
pub mod webhook;

pub use error::{InstallerError, Result};

/// Version information for the installer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
pub const BUILD_INFO: &str = concat!(
    "Version: ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Package: ",
    env!("CARGO_PKG_NAME"),
    "\n"
);
