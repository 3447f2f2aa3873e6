// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Thermal governor and adaptive detection cadence

use std::time::Duration;

use crate::config::CameraConfig;
use super::NodeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalBand {
    /// At or below the warm threshold
    Nominal,
    /// Above warm, at or below critical
    Warm,
    /// Above critical
    Critical,
}

#[derive(Debug, Clone)]
pub struct ThermalGovernor {
    warm_c: f32,
    critical_c: f32,
    throttle_c: f32,
    analyzing_interval: Duration,
    idle_interval: Duration,
    throttle_penalty: Duration,
    stream_penalty: Duration,
    cooling_pause: Duration,
}

impl ThermalGovernor {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            warm_c: config.warm_temp_c,
            critical_c: config.critical_temp_c,
            throttle_c: config.throttle_temp_c,
            analyzing_interval: Duration::from_millis(config.analyzing_interval_ms),
            idle_interval: Duration::from_millis(config.idle_interval_ms),
            throttle_penalty: Duration::from_millis(config.throttle_penalty_ms),
            stream_penalty: Duration::from_millis(config.stream_penalty_ms),
            cooling_pause: Duration::from_millis(config.cooling_pause_ms),
        }
    }

    pub fn classify(&self, celsius: f32) -> ThermalBand {
        if celsius > self.critical_c {
            ThermalBand::Critical
        } else if celsius > self.warm_c {
            ThermalBand::Warm
        } else {
            ThermalBand::Nominal
        }
    }

    /// Delay before the next detection cycle
    pub fn next_interval(&self, state: NodeState, celsius: f32, active_sessions: usize) -> Duration {
        let mut interval = if state == NodeState::Analyzing {
            self.analyzing_interval
        } else {
            self.idle_interval
        };
        if celsius > self.throttle_c {
            interval += self.throttle_penalty;
        }
        if active_sessions > 0 {
            interval += self.stream_penalty;
        }
        interval
    }

    /// Extra hold after a critical reading
    pub fn cooling_pause(&self, band: ThermalBand) -> Duration {
        if band == ThermalBand::Critical {
            self.cooling_pause
        } else {
            Duration::ZERO
        }
    }
}

impl Default for ThermalGovernor {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        let governor = ThermalGovernor::default();
        assert_eq!(governor.classify(72.0), ThermalBand::Nominal);
        assert_eq!(governor.classify(72.1), ThermalBand::Warm);
        assert_eq!(governor.classify(82.0), ThermalBand::Warm);
        assert_eq!(governor.classify(82.5), ThermalBand::Critical);
    }

    #[test]
    fn test_adaptive_interval() {
        let governor = ThermalGovernor::default();
        let ms = |d: Duration| d.as_millis();

        assert_eq!(ms(governor.next_interval(NodeState::Analyzing, 50.0, 0)), 100);
        assert_eq!(ms(governor.next_interval(NodeState::Idle, 50.0, 0)), 350);
        assert_eq!(ms(governor.next_interval(NodeState::Idle, 76.0, 0)), 550);
        assert_eq!(ms(governor.next_interval(NodeState::Streaming, 76.0, 1)), 700);
        assert_eq!(ms(governor.next_interval(NodeState::Analyzing, 75.0, 3)), 250);
    }

    #[test]
    fn test_stream_penalty_is_configurable() {
        let config = CameraConfig {
            stream_penalty_ms: 200,
            ..CameraConfig::default()
        };
        let governor = ThermalGovernor::new(&config);
        assert_eq!(
            governor.next_interval(NodeState::Streaming, 40.0, 1),
            Duration::from_millis(550)
        );
    }

    #[test]
    fn test_cooling_pause_only_when_critical() {
        let governor = ThermalGovernor::default();
        assert_eq!(governor.cooling_pause(ThermalBand::Critical), Duration::from_secs(1));
        assert_eq!(governor.cooling_pause(ThermalBand::Warm), Duration::ZERO);
    }
}
