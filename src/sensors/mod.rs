// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor and actuator capabilities shared by both node types

mod traits;
mod frame;
mod system;
pub mod simulator;

pub use traits::*;
pub use frame::FrameBuffer;
pub use system::SystemMemory;

#[cfg(test)]
pub(crate) mod testing;
