// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Simulated capabilities for demo mode and development hosts

use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::StandardNormal;
use tracing::{debug, info};

use super::{
    Actuation, Actuator, ArmSwitch, ClassifyError, DistanceSensor, FrameBuffer, FrameClassifier,
    FrameSource, MotionSensor, TemperatureSensor,
};

/// JPEG start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
/// Offset of the byte the simulated camera uses to flag a person in frame
const TARGET_MARKER_OFFSET: usize = 2;

/// Range finder that mostly sees an empty room with occasional walk-bys
pub struct SimulatedRangeFinder {
    rng: Mutex<StdRng>,
    timeout_probability: f64,
    intrusion_probability: f64,
}

impl SimulatedRangeFinder {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            timeout_probability: 0.2,
            intrusion_probability: 0.03,
        }
    }
}

impl Default for SimulatedRangeFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceSensor for SimulatedRangeFinder {
    fn read_distance(&self) -> Option<f32> {
        let mut rng = self.rng.lock();
        if rng.gen::<f64>() < self.timeout_probability {
            return None;
        }
        if rng.gen::<f64>() < self.intrusion_probability {
            return Some(rng.gen_range(5.0..29.0));
        }
        Some(rng.gen_range(80.0..400.0))
    }
}

/// PIR pair with a small random trip rate
pub struct SimulatedPir {
    rng: Mutex<StdRng>,
    trip_probability: f64,
}

impl SimulatedPir {
    pub fn new(trip_probability: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            trip_probability,
        }
    }
}

impl MotionSensor for SimulatedPir {
    fn read_motion(&self) -> bool {
        self.rng.lock().gen::<f64>() < self.trip_probability
    }
}

/// Die temperature performing a bounded random walk
pub struct SimulatedThermistor {
    state: Mutex<(StdRng, f32)>,
    min: f32,
    max: f32,
}

impl SimulatedThermistor {
    pub fn new(start: f32, min: f32, max: f32) -> Self {
        Self {
            state: Mutex::new((StdRng::from_entropy(), start)),
            min,
            max,
        }
    }
}

impl TemperatureSensor for SimulatedThermistor {
    fn read_temperature(&self) -> f32 {
        let mut state = self.state.lock();
        let (rng, temp) = &mut *state;
        let step: f32 = rng.sample(StandardNormal);
        *temp = (*temp + step * 0.3).clamp(self.min, self.max);
        *temp
    }
}

/// Camera that emits JPEG-shaped frames and occasionally a person
pub struct SimulatedCamera {
    state: Mutex<CameraScene>,
    width: u16,
    height: u16,
}

struct CameraScene {
    rng: StdRng,
    target_frames_left: u32,
    target_probability: f64,
    drop_probability: f64,
}

impl SimulatedCamera {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            state: Mutex::new(CameraScene {
                rng: StdRng::from_entropy(),
                target_frames_left: 0,
                target_probability: 0.01,
                drop_probability: 0.05,
            }),
            width,
            height,
        }
    }
}

impl FrameSource for SimulatedCamera {
    fn capture_frame(&self) -> Option<FrameBuffer> {
        let mut scene = self.state.lock();
        if scene.rng.gen::<f64>() < scene.drop_probability {
            return None;
        }

        if scene.target_frames_left == 0 && scene.rng.gen::<f64>() < scene.target_probability {
            scene.target_frames_left = scene.rng.gen_range(3..12);
            debug!("Simulated target entered the frame");
        }
        let target = scene.target_frames_left > 0;
        scene.target_frames_left = scene.target_frames_left.saturating_sub(1);

        let body_len = scene.rng.gen_range(2_000..8_000);
        let mut data = Vec::with_capacity(body_len + 4);
        data.extend_from_slice(&JPEG_SOI);
        data.push(u8::from(target));
        data.extend((0..body_len).map(|_| scene.rng.gen::<u8>()));
        data.extend_from_slice(&JPEG_EOI);

        Some(FrameBuffer::new(data, self.width, self.height))
    }
}

/// Classifier for [`SimulatedCamera`] frames
pub struct MarkerClassifier;

impl FrameClassifier for MarkerClassifier {
    fn classify(&self, frame: &FrameBuffer) -> Result<bool, ClassifyError> {
        let bytes = frame.as_bytes();
        if !bytes.starts_with(&JPEG_SOI) {
            return Err(ClassifyError::Format);
        }
        Ok(bytes.get(TARGET_MARKER_OFFSET) == Some(&1))
    }
}

/// Arm button that is never pressed
pub struct IdleSwitch;

impl ArmSwitch for IdleSwitch {
    fn pressed(&self) -> bool {
        false
    }
}

/// Actuator that renders patterns as log lines
pub struct LoggingActuator {
    last: Mutex<Option<Actuation>>,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }
}

impl Default for LoggingActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for LoggingActuator {
    fn actuate(&self, actuation: Actuation) {
        let mut last = self.last.lock();
        // Standby repeats every fusion cycle; only report changes
        if *last == Some(actuation) && matches!(actuation, Actuation::Standby { .. }) {
            return;
        }
        match actuation {
            Actuation::Standby { .. } => debug!("Actuator: {:?}", actuation),
            _ => info!("Actuator: {:?}", actuation),
        }
        *last = Some(actuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_frames_are_jpeg_shaped() {
        let camera = SimulatedCamera::new(320, 240);
        let classifier = MarkerClassifier;
        let frame = (0..100).find_map(|_| camera.capture_frame()).unwrap();

        assert!(frame.as_bytes().starts_with(&JPEG_SOI));
        assert!(frame.as_bytes().ends_with(&JPEG_EOI));
        assert!(classifier.classify(&frame).is_ok());
    }

    #[test]
    fn test_marker_classifier_rejects_non_jpeg() {
        let frame = FrameBuffer::new(vec![0x00, 0x01, 0x01], 1, 1);
        assert_eq!(MarkerClassifier.classify(&frame), Err(ClassifyError::Format));
    }

    #[test]
    fn test_thermistor_stays_in_bounds() {
        let sensor = SimulatedThermistor::new(50.0, 40.0, 60.0);
        for _ in 0..1000 {
            let t = sensor.read_temperature();
            assert!((40.0..=60.0).contains(&t));
        }
    }
}
