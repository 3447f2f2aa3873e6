// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! SectorWatch - Distributed Sector Security Network
//!
//! One hub fuses local sensors and camera alerts into a single threat level;
//! up to four camera nodes each watch one sector and report to the hub.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── Camera node (x4) ────────────────────────┐
//! │  Thermal → Capture → Classify → Debounce ──► TransportRouter     │
//! │                                                 │ bus │ datagram  │
//! │  GET /stream ◄── StreamEncoder ◄── FrameSource  │     │           │
//! └─────────────────────────────────────────────────┼─────┼───────────┘
//!                                                   ▼     ▼
//! ┌────────────────────────────── Hub ────────────────────────────────┐
//! │  BusServer / DatagramListener / HubApi / ArmPanel                 │
//! │                   │ Dispatcher                                     │
//! │                   ▼                                                │
//! │  SharedState { SystemState, PresenceTracker } ◄── FusionEngine    │
//! │                   │                                  (300 ms)      │
//! │                   ▼                                                │
//! │               StateBus ──► every bus subscriber                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

#![allow(dead_code)]

pub mod core;
pub mod sensors;
pub mod protocol;
pub mod eventlog;
pub mod hub;
pub mod camera;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use config::Config;
pub use core::{Clock, MonotonicClock, Scheduler, StateBus};
pub use error::{Error, Result};
pub use hub::{Hub, HubSensors, SharedState, SystemState};
pub use camera::{CameraCapabilities, CameraNode, NodeState};
pub use protocol::{AlertMessage, Command, DatagramRecord, StateBroadcast, UplinkMessage};

/// SectorWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SectorWatch name
pub const NAME: &str = "SectorWatch";
