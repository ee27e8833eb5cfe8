//! Remaining placeable cells per module instance.
//!
//! The editor session is the only writer. Placing a cell draws one unit,
//! erasing it restores one.

use std::collections::HashMap;
use thiserror::Error;

use crate::grid::InstanceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("module {0} is not stocked")]
    Unknown(InstanceId),
    #[error("module {0} has no cells left to place")]
    Exhausted(InstanceId),
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    remaining: HashMap<InstanceId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of cells available for `instance`, replacing any
    /// previous stock.
    pub fn stock(&mut self, instance: InstanceId, cells: u32) {
        self.remaining.insert(instance, cells);
    }

    /// Remaining cells; unknown instances have none.
    pub fn remaining(&self, instance: InstanceId) -> u32 {
        self.remaining.get(&instance).copied().unwrap_or(0)
    }

    pub fn draw(&mut self, instance: InstanceId) -> Result<u32, InventoryError> {
        let left = self
            .remaining
            .get_mut(&instance)
            .ok_or(InventoryError::Unknown(instance))?;
        if *left == 0 {
            return Err(InventoryError::Exhausted(instance));
        }
        *left -= 1;
        Ok(*left)
    }

    pub fn restore(&mut self, instance: InstanceId) -> Result<u32, InventoryError> {
        let left = self
            .remaining
            .get_mut(&instance)
            .ok_or(InventoryError::Unknown(instance))?;
        *left = left.saturating_add(1);
        Ok(*left)
    }

    pub fn is_stocked(&self, instance: InstanceId) -> bool {
        self.remaining.contains_key(&instance)
    }

    pub fn total_remaining(&self) -> u64 {
        self.remaining.values().map(|&n| n as u64).sum()
    }
}
