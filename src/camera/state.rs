// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Camera node state machine

use serde::Serialize;

use super::ThermalBand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeState {
    /// Watching, nothing seen
    Idle,
    /// Target confirmed, fast cadence
    Analyzing,
    /// Watching with at least one viewer attached
    Streaming,
    /// Thermally suspended
    Cooling,
    /// Hardware fault; only an explicit clear leaves it
    Error,
}

/// What the detection step produced this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// No classification ran (thermal suspend or no frame)
    Skipped,
    /// A positive that has not been confirmed yet
    Pending,
    Confirmed,
    Miss,
}

impl NodeState {
    pub fn code(self) -> u8 {
        match self {
            NodeState::Idle => 0,
            NodeState::Analyzing => 1,
            NodeState::Streaming => 2,
            NodeState::Cooling => 3,
            NodeState::Error => 4,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => NodeState::Idle,
            1 => NodeState::Analyzing,
            2 => NodeState::Streaming,
            3 => NodeState::Cooling,
            _ => NodeState::Error,
        }
    }

    /// Resting state for the current viewer count
    pub fn resting(active_sessions: usize) -> Self {
        if active_sessions > 0 {
            NodeState::Streaming
        } else {
            NodeState::Idle
        }
    }

    /// Whether classification is suspended for this thermal band
    pub fn suspends_detection(self, band: ThermalBand) -> bool {
        match band {
            ThermalBand::Critical => true,
            ThermalBand::Warm => self == NodeState::Cooling,
            ThermalBand::Nominal => false,
        }
    }

    /// The single transition function of the node
    pub fn transition(
        current: NodeState,
        band: ThermalBand,
        detection: Detection,
        active_sessions: usize,
    ) -> NodeState {
        if current == NodeState::Error {
            return NodeState::Error;
        }
        if band == ThermalBand::Critical {
            return NodeState::Cooling;
        }
        if current == NodeState::Cooling && band == ThermalBand::Warm {
            return NodeState::Cooling;
        }

        let base = match current {
            NodeState::Cooling | NodeState::Idle | NodeState::Streaming => {
                NodeState::resting(active_sessions)
            }
            other => other,
        };

        match detection {
            Detection::Confirmed => NodeState::Analyzing,
            Detection::Miss => NodeState::resting(active_sessions),
            Detection::Pending | Detection::Skipped => base,
        }
    }
}
