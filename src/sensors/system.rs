// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Host memory probe

use parking_lot::Mutex;
use sysinfo::System;

use super::MemoryProbe;

/// Reports available host memory, saturated to `u32` bytes like an MCU heap counter
pub struct SystemMemory {
    system: Mutex<System>,
}

impl SystemMemory {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemory {
    fn free_memory(&self) -> u32 {
        let mut system = self.system.lock();
        system.refresh_memory();
        u32::try_from(system.available_memory()).unwrap_or(u32::MAX)
    }
}
