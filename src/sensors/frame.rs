// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Captured camera frames

use std::fmt;

type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

/// A JPEG frame handed out by a [`FrameSource`](super::FrameSource).
///
/// The buffer has exactly one owner. When it is dropped the optional release
/// hook runs once, returning the underlying driver buffer.
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u16,
    height: u16,
    release: Option<ReleaseHook>,
}

impl FrameBuffer {
    pub fn new(data: Vec<u8>, width: u16, height: u16) -> Self {
        Self {
            data,
            width,
            height,
            release: None,
        }
    }

    /// Frame whose release is reported to `hook` when dropped
    pub fn with_release<F>(data: Vec<u8>, width: u16, height: u16, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            data,
            width,
            height,
            release: Some(Box::new(hook)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
