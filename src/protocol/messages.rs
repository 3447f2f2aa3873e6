// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! JSON message shapes carried on the bus

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DatagramRecord;

pub const EVENT_ALERT: &str = "alert";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_STATE_UPDATE: &str = "state_update";

pub const DEFAULT_ALERT_KIND: &str = "MOTION";
pub const DEFAULT_SECTOR: &str = "UNKNOWN";
/// Alert kind raised by a confirmed camera detection
pub const HUMAN_TARGET: &str = "HUMAN_TARGET";

/// Wraps a body with its `event` discriminator on the wire
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    event: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

/// Remote arm/disarm command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Arm,
    Disarm,
}

impl Command {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "ARM" => Some(Command::Arm),
            "DISARM" => Some(Command::Disarm),
            _ => None,
        }
    }
}

/// `{"command": "ARM" | "DISARM"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: Command,
}

impl CommandMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Alert raised by a camera node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub cam_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub sector: String,
    /// Sender die temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f32>,
}

impl AlertMessage {
    pub fn new(cam_id: i64, kind: &str, sector: &str, temp: Option<f32>) -> Self {
        Self {
            cam_id,
            kind: kind.to_string(),
            sector: sector.to_string(),
            temp,
        }
    }

    /// Read an alert body, filling every missing or mistyped field with its default
    pub fn from_value(doc: &Value) -> Self {
        Self {
            cam_id: doc.get("cam_id").and_then(Value::as_i64).unwrap_or(0),
            kind: doc
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ALERT_KIND)
                .to_string(),
            sector: doc
                .get("sector")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_SECTOR)
                .to_string(),
            temp: doc.get("temp").and_then(Value::as_f64).map(|t| t as f32),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&Envelope {
            event: EVENT_ALERT,
            body: self,
        })
        .unwrap_or_default()
    }
}

/// Hub state snapshot pushed to every subscriber each fusion cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBroadcast {
    pub armed: bool,
    pub threat: i32,
    pub prox: f32,
    pub temp: f32,
    pub log: String,
}

impl StateBroadcast {
    pub fn to_json(&self) -> String {
        serde_json::to_string(&Envelope {
            event: EVENT_STATE_UPDATE,
            body: self,
        })
        .unwrap_or_default()
    }
}

/// Camera telemetry attached to uplink traffic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub cam_id: i32,
    pub temperature: f32,
    pub free_memory: u32,
}

/// How quickly a message needs to reach the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Liveness traffic; cheapest path wins
    Routine,
    /// Evidence the hub acts on
    Critical,
}

/// Everything a camera node sends to the hub
#[derive(Debug, Clone, PartialEq)]
pub enum UplinkMessage {
    Heartbeat(Telemetry),
    Alert {
        alert: AlertMessage,
        telemetry: Telemetry,
    },
}

impl UplinkMessage {
    pub fn urgency(&self) -> Urgency {
        match self {
            UplinkMessage::Heartbeat(_) => Urgency::Routine,
            UplinkMessage::Alert { .. } => Urgency::Critical,
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        match self {
            UplinkMessage::Heartbeat(t) => t,
            UplinkMessage::Alert { telemetry, .. } => telemetry,
        }
    }

    /// JSON text form for the bus
    pub fn to_json(&self) -> String {
        match self {
            UplinkMessage::Heartbeat(t) => serde_json::json!({
                "event": EVENT_HEARTBEAT,
                "cam_id": t.cam_id,
                "temp": t.temperature,
                "heap": t.free_memory,
            })
            .to_string(),
            UplinkMessage::Alert { alert, .. } => alert.to_json(),
        }
    }

    /// Fixed binary form for the datagram path
    pub fn to_datagram(&self) -> DatagramRecord {
        let t = self.telemetry();
        match self {
            UplinkMessage::Heartbeat(_) => {
                DatagramRecord::heartbeat(t.cam_id, t.temperature, t.free_memory)
            }
            UplinkMessage::Alert { .. } => {
                DatagramRecord::alert(t.cam_id, t.temperature, t.free_memory)
            }
        }
    }
}

/// A message the hub understood
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Control(Command),
    Alert(AlertMessage),
    Heartbeat { cam_id: i64 },
}

/// Decode one text frame from the bus.
///
/// A document can carry a command and an alert at once; both are returned.
/// Anything unparseable or of unknown shape yields nothing.
pub fn decode_inbound(text: &str) -> Vec<InboundMessage> {
    let doc: Value = match serde_json::from_str(text) {
        Ok(doc) => doc,
        Err(_) => return Vec::new(),
    };
    if !doc.is_object() {
        return Vec::new();
    }

    let mut messages = Vec::new();

    if let Some(command) = doc
        .get("command")
        .and_then(Value::as_str)
        .and_then(Command::parse)
    {
        messages.push(InboundMessage::Control(command));
    }

    match doc.get("event").and_then(Value::as_str) {
        Some(EVENT_ALERT) => messages.push(InboundMessage::Alert(AlertMessage::from_value(&doc))),
        Some(EVENT_HEARTBEAT) => messages.push(InboundMessage::Heartbeat {
            cam_id: doc.get("cam_id").and_then(Value::as_i64).unwrap_or(0),
        }),
        _ => {}
    }

    messages
}
