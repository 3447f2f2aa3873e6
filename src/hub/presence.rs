// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Per-sector liveness and alert recency

use serde::Serialize;

/// Number of camera sectors the hub tracks
pub const SECTOR_COUNT: usize = 4;

/// Last contact times for one sector, monotonic ms. `None` means never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectorPresence {
    pub last_heartbeat_at: Option<u64>,
    pub last_alert_at: Option<u64>,
}

/// Status row reported per sector
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectorStatus {
    pub id: i64,
    pub online: bool,
    pub alerting: bool,
    pub last_seen_ms_ago: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PresenceTracker {
    sectors: [SectorPresence; SECTOR_COUNT],
    presence_window_ms: u64,
    breach_window_ms: u64,
}

impl PresenceTracker {
    pub fn new(presence_window_ms: u64, breach_window_ms: u64) -> Self {
        Self {
            sectors: [SectorPresence::default(); SECTOR_COUNT],
            presence_window_ms,
            breach_window_ms,
        }
    }

    fn index(sector: i64) -> Option<usize> {
        if (1..=SECTOR_COUNT as i64).contains(&sector) {
            Some((sector - 1) as usize)
        } else {
            None
        }
    }

    fn within(at: Option<u64>, now: u64, window: u64) -> bool {
        at.map_or(false, |at| now.saturating_sub(at) < window)
    }

    /// An alert is also proof of life. Returns false for an id outside 1..=4.
    pub fn record_alert(&mut self, sector: i64, now: u64) -> bool {
        match Self::index(sector) {
            Some(i) => {
                self.sectors[i].last_alert_at = Some(now);
                self.sectors[i].last_heartbeat_at = Some(now);
                true
            }
            None => false,
        }
    }

    pub fn record_heartbeat(&mut self, sector: i64, now: u64) -> bool {
        match Self::index(sector) {
            Some(i) => {
                self.sectors[i].last_heartbeat_at = Some(now);
                true
            }
            None => false,
        }
    }

    pub fn sector(&self, sector: i64) -> Option<SectorPresence> {
        Self::index(sector).map(|i| self.sectors[i])
    }

    pub fn is_online(&self, sector: i64, now: u64) -> bool {
        Self::index(sector).map_or(false, |i| {
            Self::within(self.sectors[i].last_heartbeat_at, now, self.presence_window_ms)
        })
    }

    /// Sectors that alerted within the breach window
    pub fn active_breach_count(&self, now: u64) -> usize {
        self.sectors
            .iter()
            .filter(|s| Self::within(s.last_alert_at, now, self.breach_window_ms))
            .count()
    }

    pub fn online_count(&self, now: u64) -> usize {
        self.sectors
            .iter()
            .filter(|s| Self::within(s.last_heartbeat_at, now, self.presence_window_ms))
            .count()
    }

    /// No camera online and nothing in front of the hub's own range finder
    pub fn system_offline(&self, now: u64, proximity: f32) -> bool {
        self.online_count(now) == 0 && proximity == 0.0
    }

    pub fn statuses(&self, now: u64) -> Vec<SectorStatus> {
        self.sectors
            .iter()
            .enumerate()
            .map(|(i, s)| SectorStatus {
                id: i as i64 + 1,
                online: Self::within(s.last_heartbeat_at, now, self.presence_window_ms),
                alerting: Self::within(s.last_alert_at, now, self.breach_window_ms),
                last_seen_ms_ago: s.last_heartbeat_at.map(|at| now.saturating_sub(at)),
            })
            .collect()
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(10_000, 10_000)
    }
}
