// file: src/utils/mod.rs
// version: 2.0.0
// guid: 7a0e5c3d-1f2b-4e6a-8c9d-0b1a2c3d4e5f

//! Host and arithmetic helpers

pub mod disk;
pub mod inventory;
pub mod network;
pub mod units;

pub use disk::BlockDevice;
pub use network::HostInterface;
pub use inventory::{HostInventory, StaticInventory, SystemInventory};
