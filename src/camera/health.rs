// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Camera health counters
//!
//! The detection kernel is the only writer. HTTP handlers and the heartbeat
//! task read with relaxed loads and may see slightly stale values.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::NodeState;
use crate::core::Clock;
use crate::protocol::Telemetry;

/// `/status` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraStatus {
    pub cam_id: i32,
    pub temp: f32,
    pub heap: u32,
    pub fps: f64,
}

pub struct CameraHealth {
    cam_id: i32,
    clock: Arc<dyn Clock>,
    boot_ms: u64,
    temperature: AtomicU32,
    free_memory: AtomicU32,
    frames_processed: AtomicU32,
    alerts_sent: AtomicU32,
    state: AtomicU8,
}

impl CameraHealth {
    pub fn new(cam_id: i32, clock: Arc<dyn Clock>) -> Self {
        let boot_ms = clock.now_ms();
        Self {
            cam_id,
            clock,
            boot_ms,
            temperature: AtomicU32::new(0f32.to_bits()),
            free_memory: AtomicU32::new(0),
            frames_processed: AtomicU32::new(0),
            alerts_sent: AtomicU32::new(0),
            state: AtomicU8::new(NodeState::Idle.code()),
        }
    }

    pub fn cam_id(&self) -> i32 {
        self.cam_id
    }

    pub fn record_thermal(&self, celsius: f32, free_memory: u32) {
        self.temperature.store(celsius.to_bits(), Ordering::Relaxed);
        self.free_memory.store(free_memory, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert(&self) {
        self.alerts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_state(&self, state: NodeState) {
        self.state.store(state.code(), Ordering::Relaxed);
    }

    pub fn state(&self) -> NodeState {
        NodeState::from_code(self.state.load(Ordering::Relaxed))
    }

    /// Put the node into the sticky fault state
    pub fn report_fault(&self) {
        self.set_state(NodeState::Error);
    }

    /// Leave the fault state. Returns false when there was no fault.
    pub fn clear_fault(&self) -> bool {
        self.state
            .compare_exchange(
                NodeState::Error.code(),
                NodeState::Idle.code(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    pub fn temperature(&self) -> f32 {
        f32::from_bits(self.temperature.load(Ordering::Relaxed))
    }

    pub fn free_memory(&self) -> u32 {
        self.free_memory.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u32 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn alerts_sent(&self) -> u32 {
        self.alerts_sent.load(Ordering::Relaxed)
    }

    pub fn uptime_ms(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.boot_ms)
    }

    /// Frames processed per second of uptime
    pub fn fps(&self) -> f64 {
        let uptime_secs = self.uptime_ms() as f64 / 1000.0;
        if uptime_secs <= 0.0 {
            return 0.0;
        }
        f64::from(self.frames_processed()) / uptime_secs
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            cam_id: self.cam_id,
            temperature: self.temperature(),
            free_memory: self.free_memory(),
        }
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            cam_id: self.cam_id,
            temp: self.temperature(),
            heap: self.free_memory(),
            fps: self.fps(),
        }
    }
}
