// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Fixed binary record for the low-latency datagram path
//!
//! Layout (little endian, no padding):
//!
//! ```text
//! offset  size  field
//! 0       4     id        i32
//! 4       4     kind      i32   0 = heartbeat, 1 = alert
//! 8       4     temp      f32
//! 12      4     free_mem  u32
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Encoded size of a [`DatagramRecord`]
pub const RECORD_LEN: usize = 16;

/// Record kind carried in the `kind` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramKind {
    Heartbeat,
    Alert,
}

impl DatagramKind {
    pub fn code(self) -> i32 {
        match self {
            DatagramKind::Heartbeat => 0,
            DatagramKind::Alert => 1,
        }
    }
}

impl TryFrom<i32> for DatagramKind {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(DatagramKind::Heartbeat),
            1 => Ok(DatagramKind::Alert),
            other => Err(Error::Datagram(format!("unknown kind {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatagramRecord {
    pub id: i32,
    pub kind: i32,
    pub temp: f32,
    pub free_mem: u32,
}

impl DatagramRecord {
    pub fn heartbeat(id: i32, temp: f32, free_mem: u32) -> Self {
        Self {
            id,
            kind: DatagramKind::Heartbeat.code(),
            temp,
            free_mem,
        }
    }

    pub fn alert(id: i32, temp: f32, free_mem: u32) -> Self {
        Self {
            id,
            kind: DatagramKind::Alert.code(),
            temp,
            free_mem,
        }
    }

    pub fn kind(&self) -> Result<DatagramKind> {
        DatagramKind::try_from(self.kind)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        // bincode's default encoding is fixed-width little endian
        Ok(bincode::serialize(self)?)
    }

    /// Decode a received payload; anything but an exact-size record with a known kind is rejected
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() != RECORD_LEN {
            return Err(Error::Datagram(format!(
                "expected {} bytes, got {}",
                RECORD_LEN,
                payload.len()
            )));
        }
        let record: DatagramRecord = bincode::deserialize(payload)?;
        record.kind()?;
        Ok(record)
    }
}
