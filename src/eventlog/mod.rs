// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Append-only event log
//!
//! Each entry is one line: `[<monotonic_ms>] <message>`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::core::Clock;
use crate::error::Result;

/// Line-oriented sink for domain events
pub trait EventLog: Send + Sync {
    fn log(&self, message: &str);
}

fn format_line(ms: u64, message: &str) -> String {
    format!("[{}] {}", ms, message)
}

/// Event log appended to a file on disk
pub struct FileEventLog {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    writer: Mutex<BufWriter<File>>,
}

impl FileEventLog {
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            clock,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        let line = format_line(self.clock.now_ms(), message);
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

impl EventLog for FileEventLog {
    fn log(&self, message: &str) {
        if let Err(e) = self.append(message) {
            warn!("Event log write to {} failed: {}", self.path.display(), e);
        }
    }
}

/// In-memory event log, mostly for tests
pub struct MemoryEventLog {
    clock: Arc<dyn Clock>,
    lines: Mutex<Vec<String>>,
}

impl MemoryEventLog {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of entries whose message is exactly `message`
    pub fn count(&self, message: &str) -> usize {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.split_once("] ").map(|(_, m)| m) == Some(message))
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl EventLog for MemoryEventLog {
    fn log(&self, message: &str) {
        let line = format_line(self.clock.now_ms(), message);
        self.lines.lock().push(line);
    }
}
