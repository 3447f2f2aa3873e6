// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Threat fusion cycle
//!
//! Once per tick the hub folds its own sensors and the sector alert history
//! into one threat level, drives the alarm outputs and broadcasts the result.
//! The whole cycle body runs under the shared state lock.

use std::sync::Arc;

use tracing::debug;

use super::{HubState, Journal, SharedState, MAX_THREAT};
use crate::config::FusionConfig;
use crate::core::{Clock, StateBus};
use crate::eventlog::EventLog;
use crate::protocol::StateBroadcast;
use crate::sensors::{Actuation, Actuator, DistanceSensor, MotionSensor, TemperatureSensor};

pub const BREACH_EVENT: &str = "MULTI_SECTOR_BREACH_DETECTED";

/// The hub's own sensors and outputs
#[derive(Clone)]
pub struct HubSensors {
    pub distance: Arc<dyn DistanceSensor>,
    pub motion: Arc<dyn MotionSensor>,
    pub temperature: Arc<dyn TemperatureSensor>,
    pub actuator: Arc<dyn Actuator>,
}

/// What one cycle decided
#[derive(Debug, Clone, PartialEq)]
pub struct FusionReport {
    pub actuation: Actuation,
    pub breach_started: bool,
    pub snapshot: StateBroadcast,
}

pub struct FusionEngine {
    config: FusionConfig,
    state: Arc<SharedState>,
    sensors: HubSensors,
    clock: Arc<dyn Clock>,
    bus: Arc<StateBus>,
    log: Arc<dyn EventLog>,
}

impl FusionEngine {
    pub fn new(
        config: FusionConfig,
        state: Arc<SharedState>,
        sensors: HubSensors,
        clock: Arc<dyn Clock>,
        bus: Arc<StateBus>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            config,
            state,
            sensors,
            clock,
            bus,
            log,
        }
    }

    pub fn run_cycle(&self) -> FusionReport {
        let now = self.clock.now_ms();
        let mut journal = Journal::default();

        let report = self.state.apply(|hub| {
            let report = self.fuse(hub, now, &mut journal);
            self.sensors.actuator.actuate(report.actuation);
            self.bus.publish(report.snapshot.clone());
            report
        });

        journal.flush(self.log.as_ref());
        report
    }

    fn fuse(&self, hub: &mut HubState, now: u64, journal: &mut Journal) -> FusionReport {
        let cfg = &self.config;
        let HubState { system, presence } = hub;

        // A missing echo reads as nothing in range
        let proximity = self.sensors.distance.read_distance().unwrap_or(0.0);
        system.proximity = proximity;
        if proximity > 0.0 && proximity < cfg.proximity_threshold_cm && system.armed {
            system.raise_threat(cfg.proximity_delta);
            let message = format!(
                "PROX_ALERT: OBJ @ {:.2}cm | THREAT: {}",
                proximity, system.threat_level
            );
            journal.record(system, message);
        }

        if self.sensors.motion.read_motion() && system.armed {
            system.raise_threat(cfg.motion_delta);
            let message = format!("LOCAL_MOTION: PIR_TRIP | THREAT: {}", system.threat_level);
            journal.record(system, message);
        }

        system.core_temp = self.sensors.temperature.read_temperature();

        if system.threat_level > 0 {
            system.threat_level -= cfg.decay;
        }
        system.clamp();

        let breaching =
            presence.active_breach_count(now) >= cfg.breach_min_sectors && system.armed;
        let breach_started = breaching && !system.multi_sector_breach;
        if breaching {
            if breach_started {
                journal.record(system, BREACH_EVENT);
            }
            system.multi_sector_breach = true;
            system.threat_level = MAX_THREAT;
        } else {
            system.multi_sector_breach = false;
        }

        let actuation = if system.threat_level > cfg.alarm_threshold && system.armed {
            if system.multi_sector_breach {
                Actuation::Breach
            } else {
                Actuation::Alarm
            }
        } else {
            Actuation::Standby {
                armed: system.armed,
            }
        };

        debug!(
            "Fusion: threat={} prox={:.1} temp={:.1} breach={}",
            system.threat_level, system.proximity, system.core_temp, system.multi_sector_breach
        );

        FusionReport {
            actuation,
            breach_started,
            snapshot: system.broadcast(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::eventlog::MemoryEventLog;
    use crate::hub::{Dispatcher, PresenceTracker, SystemState};
    use crate::sensors::testing::{
        RecordingActuator, ScriptedDistance, SettableTemperature, SwitchedMotion,
    };
    use std::sync::atomic::Ordering;

    struct Rig {
        engine: FusionEngine,
        state: Arc<SharedState>,
        clock: Arc<ManualClock>,
        motion: Arc<SwitchedMotion>,
        actuator: Arc<RecordingActuator>,
        log: Arc<MemoryEventLog>,
        bus: Arc<StateBus>,
    }

    fn rig(distance: ScriptedDistance) -> Rig {
        let clock = Arc::new(ManualClock::new(50_000));
        let state = Arc::new(SharedState::new(
            SystemState::boot(true),
            PresenceTracker::default(),
        ));
        let motion = Arc::new(SwitchedMotion::default());
        let actuator = Arc::new(RecordingActuator::default());
        let log = Arc::new(MemoryEventLog::new(clock.clone()));
        let bus = Arc::new(StateBus::new(16));
        let sensors = HubSensors {
            distance: Arc::new(distance),
            motion: motion.clone(),
            temperature: Arc::new(SettableTemperature::new(44.0)),
            actuator: actuator.clone(),
        };
        let engine = FusionEngine::new(
            FusionConfig::default(),
            state.clone(),
            sensors,
            clock.clone(),
            bus.clone(),
            log.clone(),
        );
        Rig {
            engine,
            state,
            clock,
            motion,
            actuator,
            log,
            bus,
        }
    }

    fn threat(rig: &Rig) -> i32 {
        rig.state.snapshot().system.threat_level
    }

    #[test]
    fn test_proximity_adds_ten_before_decay() {
        let rig = rig(ScriptedDistance::new([Some(25.0)], None));
        rig.state.apply(|hub| hub.system.threat_level = 40);

        rig.engine.run_cycle();

        assert_eq!(threat(&rig), 40 + 10 - 1);
        assert_eq!(rig.state.snapshot().system.proximity, 25.0);
        assert!(rig.log.contains("PROX_ALERT: OBJ @ 25.00cm | THREAT: 50"));
    }

    #[test]
    fn test_far_object_and_timeout_add_nothing() {
        let rig = rig(ScriptedDistance::new([Some(30.0), None, Some(0.0)], None));
        rig.state.apply(|hub| hub.system.threat_level = 10);

        for _ in 0..3 {
            rig.engine.run_cycle();
        }
        assert_eq!(threat(&rig), 7);
        assert!(!rig.log.contains("PROX_ALERT"));
    }

    #[test]
    fn test_motion_adds_fifteen() {
        let rig = rig(ScriptedDistance::silent());
        rig.motion.tripped.store(true, Ordering::SeqCst);

        rig.engine.run_cycle();

        assert_eq!(threat(&rig), 14);
        assert!(rig.log.contains("LOCAL_MOTION: PIR_TRIP | THREAT: 15"));
    }

    #[test]
    fn test_decay_by_one_until_zero() {
        let rig = rig(ScriptedDistance::silent());
        rig.state.apply(|hub| hub.system.threat_level = 3);

        let mut levels = Vec::new();
        for _ in 0..5 {
            levels.push(rig.engine.run_cycle().snapshot.threat);
        }
        assert_eq!(levels, vec![2, 1, 0, 0, 0]);
    }

    #[test]
    fn test_threat_stays_in_range() {
        let rig = rig(ScriptedDistance::new([Some(5.0); 20], None));
        rig.motion.tripped.store(true, Ordering::SeqCst);

        for _ in 0..20 {
            let report = rig.engine.run_cycle();
            assert!((0..=100).contains(&report.snapshot.threat));
        }
        assert_eq!(threat(&rig), 100);
        assert_eq!(rig.actuator.last(), Some(Actuation::Alarm));
    }

    #[test]
    fn test_multi_sector_breach_logs_once() {
        let rig = rig(ScriptedDistance::silent());
        let now = rig.clock.now_ms();
        rig.state.apply(|hub| {
            hub.presence.record_alert(1, now);
            hub.presence.record_alert(3, now + 100);
        });
        rig.clock.advance(200);

        let first = rig.engine.run_cycle();
        assert!(first.breach_started);
        assert_eq!(first.actuation, Actuation::Breach);
        assert_eq!(first.snapshot.threat, 100);

        for _ in 0..5 {
            rig.clock.advance(300);
            let report = rig.engine.run_cycle();
            assert!(!report.breach_started);
            assert_eq!(report.snapshot.threat, 100);
        }

        let snapshot = rig.state.snapshot();
        assert!(snapshot.system.multi_sector_breach);
        assert_eq!(rig.log.count(BREACH_EVENT), 1);
    }

    #[test]
    fn test_breach_clears_after_window() {
        let rig = rig(ScriptedDistance::silent());
        let now = rig.clock.now_ms();
        rig.state.apply(|hub| {
            hub.presence.record_alert(2, now);
            hub.presence.record_alert(4, now);
        });
        rig.engine.run_cycle();

        rig.clock.advance(10_000);
        let report = rig.engine.run_cycle();

        assert!(!rig.state.snapshot().system.multi_sector_breach);
        assert_eq!(report.snapshot.threat, 99);
        assert_eq!(report.actuation, Actuation::Alarm);
    }

    #[test]
    fn test_single_sector_never_breaches() {
        let rig = rig(ScriptedDistance::silent());
        for _ in 0..10 {
            let now = rig.clock.now_ms();
            rig.state.apply(|hub| {
                hub.presence.record_alert(2, now);
            });
            rig.engine.run_cycle();
            rig.clock.advance(300);
        }
        assert!(!rig.state.snapshot().system.multi_sector_breach);
        assert_eq!(rig.log.count(BREACH_EVENT), 0);
    }

    #[test]
    fn test_disarmed_ignores_local_evidence_and_breach() {
        let rig = rig(ScriptedDistance::new([Some(10.0); 4], None));
        rig.motion.tripped.store(true, Ordering::SeqCst);
        let now = rig.clock.now_ms();
        rig.state.apply(|hub| {
            hub.system.armed = false;
            hub.presence.record_alert(1, now);
            hub.presence.record_alert(2, now);
        });

        for _ in 0..4 {
            let report = rig.engine.run_cycle();
            assert_eq!(report.snapshot.threat, 0);
            assert_eq!(report.actuation, Actuation::Standby { armed: false });
        }
        assert!(!rig.state.snapshot().system.multi_sector_breach);
    }

    #[test]
    fn test_disarm_command_holds_threat_until_rearmed() {
        let rig = rig(ScriptedDistance::new([Some(25.0); 8], None));
        let dispatcher = Dispatcher::new(
            &FusionConfig::default(),
            rig.state.clone(),
            rig.clock.clone(),
            rig.actuator.clone(),
            rig.log.clone(),
        );

        assert_eq!(dispatcher.handle_text(r#"{"command":"DISARM"}"#), 1);
        for _ in 0..3 {
            let report = rig.engine.run_cycle();
            assert_eq!(report.snapshot.threat, 0);
            rig.clock.advance(300);
        }
        assert_eq!(rig.log.count("PROX_ALERT: OBJ @ 25.00cm | THREAT: 10"), 0);

        assert_eq!(dispatcher.handle_text(r#"{"command":"ARM"}"#), 1);
        let report = rig.engine.run_cycle();
        assert_eq!(report.snapshot.threat, 9);
        assert_eq!(rig.log.count("PROX_ALERT: OBJ @ 25.00cm | THREAT: 10"), 1);
        assert_eq!(rig.log.count("REMOTE_UNLOCK"), 1);
        assert_eq!(rig.log.count("REMOTE_LOCK"), 1);
    }

    #[test]
    fn test_cycle_publishes_snapshot() {
        let rig = rig(ScriptedDistance::silent());
        let mut rx = rig.bus.subscribe();

        rig.engine.run_cycle();

        let snapshot = rx.try_recv().unwrap();
        assert!(snapshot.armed);
        assert_eq!(snapshot.temp, 44.0);
        assert_eq!(snapshot.log, "KERNEL_BOOT");
        assert_eq!(rig.bus.published(), 1);
    }
}
