// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Capability traits for sensors and actuators
//!
//! Every hardware touch point of both node types goes through one of these
//! narrow traits. Reads are synchronous and bounded: the hub calls them while
//! holding its state lock.

use serde::{Deserialize, Serialize};

use super::FrameBuffer;

/// Ultrasonic range finder
pub trait DistanceSensor: Send + Sync {
    /// Distance to the nearest object in centimetres.
    ///
    /// `None` means no echo arrived within the bounded pulse wait.
    fn read_distance(&self) -> Option<f32>;
}

/// Passive infrared motion input (any tripped pin counts)
pub trait MotionSensor: Send + Sync {
    fn read_motion(&self) -> bool;
}

/// Die or board temperature in degrees Celsius
pub trait TemperatureSensor: Send + Sync {
    fn read_temperature(&self) -> f32;
}

/// Camera frame capture
pub trait FrameSource: Send + Sync {
    /// Grab the next frame, `None` when the driver has nothing ready.
    ///
    /// Called from async stream and HTTP handlers, so it must return promptly
    /// and never block waiting for the sensor.
    fn capture_frame(&self) -> Option<FrameBuffer>;
}

/// Classifier failure (allocation or pixel-format conversion)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("frame matrix allocation failed")]
    Allocation,
    #[error("frame format conversion failed")]
    Format,
}

/// Face/human region classifier
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &FrameBuffer) -> Result<bool, ClassifyError>;
}

/// Free heap/memory probe used for camera telemetry
pub trait MemoryProbe: Send + Sync {
    fn free_memory(&self) -> u32;
}

/// Momentary panel button wired to the hub's arm toggle
pub trait ArmSwitch: Send + Sync {
    fn pressed(&self) -> bool;
}

/// Output patterns the core asks the actuator layer to render.
///
/// Exact tones and LED wiring belong to the actuator implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actuation {
    /// No alarm; status light shows armed/disarmed
    Standby { armed: bool },
    /// Threat above the alarm threshold
    Alarm,
    /// Threat above the alarm threshold with a multi-sector breach in progress
    Breach,
    /// System armed (rising chirp)
    Lock,
    /// System disarmed (falling chirp)
    Unlock,
    /// Short pulse acknowledging a remote alert
    AlertChirp,
}

/// Buzzer/LED driver
pub trait Actuator: Send + Sync {
    fn actuate(&self, actuation: Actuation);
}
