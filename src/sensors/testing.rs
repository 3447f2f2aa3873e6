// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Scripted capability doubles for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    Actuation, Actuator, ArmSwitch, ClassifyError, DistanceSensor, FrameBuffer, FrameClassifier,
    FrameSource, MemoryProbe, MotionSensor, TemperatureSensor,
};

/// Replays distances, then keeps returning the fallback
pub struct ScriptedDistance {
    script: Mutex<VecDeque<Option<f32>>>,
    fallback: Option<f32>,
}

impl ScriptedDistance {
    pub fn new(script: impl IntoIterator<Item = Option<f32>>, fallback: Option<f32>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
        }
    }

    pub fn silent() -> Self {
        Self::new([], None)
    }
}

impl DistanceSensor for ScriptedDistance {
    fn read_distance(&self) -> Option<f32> {
        self.script.lock().pop_front().unwrap_or(self.fallback)
    }
}

#[derive(Default)]
pub struct SwitchedMotion {
    pub tripped: AtomicBool,
}

impl MotionSensor for SwitchedMotion {
    fn read_motion(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

pub struct SettableTemperature {
    bits: AtomicU32,
}

impl SettableTemperature {
    pub fn new(celsius: f32) -> Self {
        Self {
            bits: AtomicU32::new(celsius.to_bits()),
        }
    }

    pub fn set(&self, celsius: f32) {
        self.bits.store(celsius.to_bits(), Ordering::SeqCst);
    }
}

impl TemperatureSensor for SettableTemperature {
    fn read_temperature(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingActuator {
    pub seen: Mutex<Vec<Actuation>>,
}

impl RecordingActuator {
    pub fn last(&self) -> Option<Actuation> {
        self.seen.lock().last().copied()
    }

    pub fn count(&self, actuation: Actuation) -> usize {
        self.seen.lock().iter().filter(|a| **a == actuation).count()
    }
}

impl Actuator for RecordingActuator {
    fn actuate(&self, actuation: Actuation) {
        self.seen.lock().push(actuation);
    }
}

#[derive(Default)]
pub struct ScriptedSwitch {
    presses: Mutex<VecDeque<bool>>,
}

impl ScriptedSwitch {
    pub fn new(presses: impl IntoIterator<Item = bool>) -> Self {
        Self {
            presses: Mutex::new(presses.into_iter().collect()),
        }
    }
}

impl ArmSwitch for ScriptedSwitch {
    fn pressed(&self) -> bool {
        self.presses.lock().pop_front().unwrap_or(false)
    }
}

/// Frame source handing out fixed-size frames and counting releases
pub struct CountingFrames {
    pub available: AtomicBool,
    pub frame_len: usize,
    pub captured: AtomicUsize,
    pub released: Arc<AtomicUsize>,
}

impl CountingFrames {
    pub fn new(frame_len: usize) -> Self {
        Self {
            available: AtomicBool::new(true),
            frame_len,
            captured: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }
}

impl FrameSource for CountingFrames {
    fn capture_frame(&self) -> Option<FrameBuffer> {
        if !self.available.load(Ordering::SeqCst) {
            return None;
        }
        let n = self.captured.fetch_add(1, Ordering::SeqCst);
        let released = self.released.clone();
        let data = (0..self.frame_len).map(|i| (i + n) as u8).collect();
        Some(FrameBuffer::with_release(data, 160, 120, move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// Replays classification results and counts calls
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<bool, ClassifyError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Result<bool, ClassifyError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FrameClassifier for ScriptedClassifier {
    fn classify(&self, _frame: &FrameBuffer) -> Result<bool, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or(Ok(false))
    }
}

pub struct FixedMemory(pub u32);

impl MemoryProbe for FixedMemory {
    fn free_memory(&self) -> u32 {
        self.0
    }
}
