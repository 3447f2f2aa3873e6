// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Lock-owned hub state

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use super::PresenceTracker;
use crate::eventlog::EventLog;
use crate::protocol::StateBroadcast;

pub const MIN_THREAT: i32 = 0;
pub const MAX_THREAT: i32 = 100;

/// Hub system state, mutated only through [`SharedState::apply`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemState {
    pub armed: bool,
    pub threat_level: i32,
    pub core_temp: f32,
    pub proximity: f32,
    pub last_event: String,
    pub multi_sector_breach: bool,
    pub alerts_received: u32,
}

impl SystemState {
    pub fn boot(armed: bool) -> Self {
        Self {
            armed,
            threat_level: MIN_THREAT,
            core_temp: 0.0,
            proximity: 0.0,
            last_event: "KERNEL_BOOT".to_string(),
            multi_sector_breach: false,
            alerts_received: 0,
        }
    }

    pub fn raise_threat(&mut self, delta: i32) {
        self.threat_level = self.threat_level.saturating_add(delta);
    }

    pub fn clamp(&mut self) {
        self.threat_level = self.threat_level.clamp(MIN_THREAT, MAX_THREAT);
    }

    pub fn broadcast(&self) -> StateBroadcast {
        StateBroadcast {
            armed: self.armed,
            threat: self.threat_level,
            prox: self.proximity,
            temp: self.core_temp,
            log: self.last_event.clone(),
        }
    }
}

/// Domain events raised under the lock, written out once it is released
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<String>,
}

impl Journal {
    /// Record an event and make it the state's `last_event`
    pub fn record(&mut self, system: &mut SystemState, message: impl Into<String>) {
        let message = message.into();
        system.last_event = message.clone();
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn flush(self, log: &dyn EventLog) {
        for entry in self.entries {
            info!("[SENTINEL] {}", entry);
            log.log(&entry);
        }
    }
}

/// Everything guarded by the hub's single lock
#[derive(Debug, Clone)]
pub struct HubState {
    pub system: SystemState,
    pub presence: PresenceTracker,
}

/// Sole owner of [`HubState`].
///
/// Callers only ever see copies or run a mutation under the lock. The threat
/// level is back in range every time the lock is released. There is no lock
/// timeout.
pub struct SharedState {
    inner: Mutex<HubState>,
}

impl SharedState {
    pub fn new(system: SystemState, presence: PresenceTracker) -> Self {
        Self {
            inner: Mutex::new(HubState { system, presence }),
        }
    }

    pub fn snapshot(&self) -> HubState {
        self.inner.lock().clone()
    }

    pub fn apply<R>(&self, mutation: impl FnOnce(&mut HubState) -> R) -> R {
        let mut guard = self.inner.lock();
        let result = mutation(&mut guard);
        guard.system.clamp();
        result
    }

    pub fn broadcast(&self) -> StateBroadcast {
        self.inner.lock().system.broadcast()
    }
}
