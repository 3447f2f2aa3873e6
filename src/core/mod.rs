// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Core runtime pieces shared by both node types

mod clock;
mod scheduler;
mod event_bus;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use scheduler::Scheduler;
pub use event_bus::StateBus;
