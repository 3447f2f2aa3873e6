// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Front panel arm button

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use super::Dispatcher;
use crate::sensors::ArmSwitch;

/// Ignore the button for this long after a toggle
pub const PRESS_HOLDOFF: Duration = Duration::from_millis(500);

/// Polls the panel button and toggles the armed state on each press
pub struct ArmPanel {
    switch: Arc<dyn ArmSwitch>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
}

impl ArmPanel {
    pub fn new(switch: Arc<dyn ArmSwitch>, dispatcher: Arc<Dispatcher>, interval: Duration) -> Self {
        Self {
            switch,
            dispatcher,
            interval,
        }
    }

    /// One poll. Returns the new armed state when the button was pressed.
    pub fn poll(&self) -> Option<bool> {
        if !self.switch.pressed() {
            return None;
        }
        let armed = self.dispatcher.toggle_armed();
        info!("Panel button: {}", if armed { "armed" } else { "disarmed" });
        Some(armed)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let pause = match self.poll() {
                Some(_) => self.interval + PRESS_HOLDOFF,
                None => self.interval,
            };
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.recv() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::core::ManualClock;
    use crate::eventlog::MemoryEventLog;
    use crate::hub::{PresenceTracker, SharedState, SystemState};
    use crate::sensors::testing::{RecordingActuator, ScriptedSwitch};
    use crate::sensors::Actuation;

    #[test]
    fn test_press_toggles_armed() {
        let clock = Arc::new(ManualClock::new(0));
        let actuator = Arc::new(RecordingActuator::default());
        let dispatcher = Arc::new(Dispatcher::new(
            &FusionConfig::default(),
            Arc::new(SharedState::new(SystemState::boot(true), PresenceTracker::default())),
            clock.clone(),
            actuator.clone(),
            Arc::new(MemoryEventLog::new(clock)),
        ));
        let panel = ArmPanel::new(
            Arc::new(ScriptedSwitch::new([true, false, true])),
            dispatcher.clone(),
            Duration::from_millis(250),
        );

        assert_eq!(panel.poll(), Some(false));
        assert_eq!(panel.poll(), None);
        assert_eq!(panel.poll(), Some(true));
        assert_eq!(actuator.last(), Some(Actuation::Lock));
        assert_eq!(dispatcher.state().snapshot().system.last_event, "KERNEL_BOOT");
    }
}
