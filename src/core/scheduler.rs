// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Task scheduler for timed operations

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

struct ScheduledTask {
    interval: Duration,
    enabled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Runs named tasks at a fixed cadence on the tokio runtime
pub struct Scheduler {
    tasks: Mutex<HashMap<String, ScheduledTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule an async task. A late tick is delayed rather than bursted.
    pub fn add_task<F, Fut>(&self, name: &str, interval: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let enabled = Arc::new(AtomicBool::new(true));
        let gate = enabled.clone();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if gate.load(Ordering::Relaxed) {
                    task().await;
                }
            }
        });

        let replaced = self.tasks.lock().insert(
            task_name,
            ScheduledTask {
                interval,
                enabled,
                handle,
            },
        );
        if let Some(old) = replaced {
            warn!("Replacing scheduled task '{}'", name);
            old.handle.abort();
        }
        debug!("Scheduled task '{}' with interval {:?}", name, interval);
    }

    /// Schedule a synchronous task on the blocking pool.
    ///
    /// The next tick waits for the previous run to finish.
    pub fn add_blocking_task<F>(&self, name: &str, interval: Duration, task: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = Arc::new(task);
        let task_name = name.to_string();
        self.add_task(name, interval, move || {
            let task = task.clone();
            let task_name = task_name.clone();
            async move {
                if let Err(e) = tokio::task::spawn_blocking(move || (*task)()).await {
                    warn!("Task '{}' panicked: {}", task_name, e);
                }
            }
        });
    }

    pub fn remove_task(&self, name: &str) {
        if let Some(task) = self.tasks.lock().remove(name) {
            task.handle.abort();
        }
    }

    pub fn enable_task(&self, name: &str, enabled: bool) {
        if let Some(task) = self.tasks.lock().get(name) {
            task.enabled.store(enabled, Ordering::Relaxed);
        }
    }

    pub fn interval_of(&self, name: &str) -> Option<Duration> {
        self.tasks.lock().get(name).map(|t| t.interval)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Abort every scheduled task
    pub fn shutdown(&self) {
        for (_, task) in self.tasks.lock().drain() {
            task.handle.abort();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
