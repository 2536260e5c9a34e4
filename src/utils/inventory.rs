// file: src/utils/inventory.rs
// version: 1.0.0
// guid: 4b1d9e0c-5f3a-4c8e-a2d7-8e9f0a1b2c3d

//! Host inventory seam used by validation and interface resolution

use super::disk::{self, BlockDevice};
use super::network::{self, HostInterface};
use crate::error::Result;

/// Source of the interfaces and disks present on the install target
pub trait HostInventory {
    fn interfaces(&self) -> Result<Vec<HostInterface>>;
    fn block_devices(&self) -> Result<Vec<BlockDevice>>;
}

/// Inventory of the machine this process runs on
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInventory;

impl HostInventory for SystemInventory {
    fn interfaces(&self) -> Result<Vec<HostInterface>> {
        network::list_interfaces()
    }

    fn block_devices(&self) -> Result<Vec<BlockDevice>> {
        disk::list_block_devices()
    }
}

/// Fixed inventory, for tests and for replaying a captured host
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    pub interfaces: Vec<HostInterface>,
    pub block_devices: Vec<BlockDevice>,
}

impl HostInventory for StaticInventory {
    fn interfaces(&self) -> Result<Vec<HostInterface>> {
        Ok(self.interfaces.clone())
    }

    fn block_devices(&self) -> Result<Vec<BlockDevice>> {
        Ok(self.block_devices.clone())
    }
}
