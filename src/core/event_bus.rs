// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! State broadcast bus for pushing hub snapshots to subscribers

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::protocol::StateBroadcast;

/// Fan-out of [`StateBroadcast`] snapshots.
///
/// Publishing never blocks; a lagging subscriber loses old snapshots.
pub struct StateBus {
    tx: broadcast::Sender<StateBroadcast>,
    published: AtomicU64,
}

impl StateBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, snapshot: StateBroadcast) {
        self.published.fetch_add(1, Ordering::Relaxed);
        // No subscribers is fine
        let _ = self.tx.send(snapshot);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateBroadcast> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Snapshots published since start
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for StateBus {
    fn default() -> Self {
        Self::new(64)
    }
}
