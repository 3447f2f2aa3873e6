// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Inbound command, alert and heartbeat handling

use std::sync::Arc;

use tracing::debug;

use super::{Journal, SharedState};
use crate::config::FusionConfig;
use crate::core::Clock;
use crate::eventlog::EventLog;
use crate::protocol::{
    decode_inbound, AlertMessage, Command, DatagramKind, DatagramRecord, InboundMessage,
};
use crate::sensors::{Actuation, Actuator};

/// Applies everything the network surfaces receive to the shared state.
///
/// Each message takes the state lock once for its mutation. Actuation and
/// event log writes happen after the lock is released.
pub struct Dispatcher {
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
    actuator: Arc<dyn Actuator>,
    log: Arc<dyn EventLog>,
    remote_alert_delta: i32,
}

impl Dispatcher {
    pub fn new(
        config: &FusionConfig,
        state: Arc<SharedState>,
        clock: Arc<dyn Clock>,
        actuator: Arc<dyn Actuator>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            state,
            clock,
            actuator,
            log,
            remote_alert_delta: config.remote_alert_delta,
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Handle one bus text frame; returns how many messages it carried
    pub fn handle_text(&self, text: &str) -> usize {
        let messages = decode_inbound(text);
        if messages.is_empty() {
            debug!("Ignoring bus frame: {}", text);
        }
        let count = messages.len();
        for message in messages {
            self.handle(message);
        }
        count
    }

    pub fn handle(&self, message: InboundMessage) {
        match message {
            InboundMessage::Control(command) => self.handle_command(command),
            InboundMessage::Alert(alert) => self.handle_alert(alert),
            InboundMessage::Heartbeat { cam_id } => {
                let now = self.clock.now_ms();
                self.state.apply(|hub| hub.presence.record_heartbeat(cam_id, now));
            }
        }
    }

    fn handle_command(&self, command: Command) {
        match command {
            Command::Arm => self.set_armed(true, "REMOTE_LOCK"),
            Command::Disarm => self.set_armed(false, "REMOTE_UNLOCK"),
        }
    }

    /// Arm or disarm from the HTTP surface
    pub fn set_armed_remote(&self, armed: bool) {
        let event = if armed { "REMOTE_ARMED" } else { "REMOTE_DISARMED" };
        self.set_armed(armed, event);
    }

    fn set_armed(&self, armed: bool, event: &str) {
        let mut journal = Journal::default();
        self.state.apply(|hub| {
            hub.system.armed = armed;
            journal.record(&mut hub.system, event);
        });
        self.actuator.actuate(lock_chirp(armed));
        journal.flush(self.log.as_ref());
    }

    /// Flip the armed flag from the panel button. Returns the new state.
    pub fn toggle_armed(&self) -> bool {
        let armed = self.state.apply(|hub| {
            hub.system.armed = !hub.system.armed;
            hub.system.armed
        });
        self.actuator.actuate(lock_chirp(armed));
        armed
    }

    /// Remote alerts raise the threat whether or not the system is armed
    fn handle_alert(&self, alert: AlertMessage) {
        let now = self.clock.now_ms();
        let mut journal = Journal::default();
        self.state.apply(|hub| {
            hub.system.raise_threat(self.remote_alert_delta);
            if !hub.presence.record_alert(alert.cam_id, now) {
                debug!("Alert from cam {} outside sector range", alert.cam_id);
            }
            hub.system.alerts_received = hub.system.alerts_received.saturating_add(1);
            let message = format!(
                "[SEC_{}] - {} | LVL: {}",
                alert.sector, alert.kind, hub.system.threat_level
            );
            journal.record(&mut hub.system, message);
        });
        self.actuator.actuate(Actuation::AlertChirp);
        journal.flush(self.log.as_ref());
    }

    /// Datagrams only feed presence; threat comes from the JSON alert
    pub fn handle_datagram(&self, payload: &[u8]) {
        let record = match DatagramRecord::decode(payload) {
            Ok(record) => record,
            Err(e) => {
                debug!("Dropping datagram: {}", e);
                return;
            }
        };
        let now = self.clock.now_ms();
        let sector = i64::from(record.id);
        let known = self.state.apply(|hub| match record.kind() {
            Ok(DatagramKind::Alert) => hub.presence.record_alert(sector, now),
            Ok(DatagramKind::Heartbeat) => hub.presence.record_heartbeat(sector, now),
            Err(_) => false,
        });
        if !known {
            debug!("Datagram from cam {} outside sector range", record.id);
        }
    }
}

fn lock_chirp(armed: bool) -> Actuation {
    if armed {
        Actuation::Lock
    } else {
        Actuation::Unlock
    }
}
