// file: src/cli/mod.rs
// version: 2.0.0
// guid: e5f6a7b8-c9d0-1234-5678-901234efabcd

//! Command line interface for the HCI installer configuration engine

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
