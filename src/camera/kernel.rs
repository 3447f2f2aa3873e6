// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Detection kernel: thermal check, capture, classify, debounce

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    CameraHealth, Detection, DetectionDebouncer, NodeState, SessionCounter, ThermalBand,
    ThermalGovernor,
};
use crate::protocol::{AlertMessage, UplinkMessage, HUMAN_TARGET};
use crate::sensors::{FrameClassifier, FrameSource, MemoryProbe, TemperatureSensor};

/// Hardware a camera node runs on
#[derive(Clone)]
pub struct CameraCapabilities {
    pub frames: Arc<dyn FrameSource>,
    pub classifier: Arc<dyn FrameClassifier>,
    pub temperature: Arc<dyn TemperatureSensor>,
    pub memory: Arc<dyn MemoryProbe>,
}

/// Outcome of one detection cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub band: ThermalBand,
    pub detection: Detection,
    pub state: NodeState,
    pub next_delay: Duration,
    pub alert: Option<UplinkMessage>,
}

pub struct DetectionKernel {
    sector: String,
    caps: CameraCapabilities,
    governor: ThermalGovernor,
    debouncer: DetectionDebouncer,
    health: Arc<CameraHealth>,
    sessions: SessionCounter,
}

impl DetectionKernel {
    pub fn new(
        sector: &str,
        caps: CameraCapabilities,
        governor: ThermalGovernor,
        debouncer: DetectionDebouncer,
        health: Arc<CameraHealth>,
        sessions: SessionCounter,
    ) -> Self {
        Self {
            sector: sector.to_string(),
            caps,
            governor,
            debouncer,
            health,
            sessions,
        }
    }

    pub fn run_cycle(&mut self) -> CycleReport {
        let celsius = self.caps.temperature.read_temperature();
        self.health
            .record_thermal(celsius, self.caps.memory.free_memory());
        let band = self.governor.classify(celsius);
        let current = self.health.state();

        match band {
            ThermalBand::Critical => warn!(">>> CRITICAL THERMAL EVENT ({:.1}C): SUSPENDING DETECTION", celsius),
            ThermalBand::Warm => debug!("Thermal warning ({:.1}C): throttling", celsius),
            ThermalBand::Nominal => {}
        }

        let detection = if current == NodeState::Error || current.suspends_detection(band) {
            Detection::Skipped
        } else {
            self.detect()
        };

        let sessions = self.sessions.active();
        let state = NodeState::transition(current, band, detection, sessions);
        self.health.set_state(state);

        let alert = if detection == Detection::Confirmed {
            self.health.record_alert();
            info!("[{}] -> HUMAN VERIFIED. ALERTING.", self.sector);
            Some(UplinkMessage::Alert {
                alert: AlertMessage::new(
                    i64::from(self.health.cam_id()),
                    HUMAN_TARGET,
                    &self.sector,
                    Some(celsius),
                ),
                telemetry: self.health.telemetry(),
            })
        } else {
            None
        };

        let next_delay =
            self.governor.cooling_pause(band) + self.governor.next_interval(state, celsius, sessions);

        CycleReport {
            band,
            detection,
            state,
            next_delay,
            alert,
        }
    }

    fn detect(&mut self) -> Detection {
        let frame = match self.caps.frames.capture_frame() {
            Some(frame) => frame,
            None => return Detection::Skipped,
        };
        self.health.record_frame();

        let positive = match self.caps.classifier.classify(&frame) {
            Ok(positive) => positive,
            Err(e) => {
                debug!("Classification failed, counting as negative: {}", e);
                false
            }
        };
        drop(frame);

        self.debouncer.observe(positive)
    }

    pub fn hits(&self) -> u32 {
        self.debouncer.hits()
    }
}
