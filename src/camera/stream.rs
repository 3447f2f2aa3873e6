// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Pull-based multipart JPEG stream encoder
//!
//! The transport asks for the next chunk with a buffer; the encoder fills what
//! it can and never blocks. A return of zero means "no progress yet", not end
//! of stream. Each part is
//!
//! ```text
//! --pyramid_frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <n>\r\n
//! \r\n
//! <n bytes of JPEG>\r\n
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};

use crate::sensors::{FrameBuffer, FrameSource};

pub const BOUNDARY: &str = "pyramid_frame";
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=pyramid_frame";

const TERMINATOR: &[u8] = b"\r\n";

pub fn part_header(frame_len: usize) -> String {
    format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY, frame_len
    )
}

/// Smallest chunk that always fits a whole part header, or the terminator
pub fn min_chunk_size() -> usize {
    part_header(u32::MAX as usize).len() + TERMINATOR.len()
}

/// Shared count of open stream sessions
#[derive(Debug, Clone, Default)]
pub struct SessionCounter {
    active: Arc<AtomicUsize>,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> StreamSession {
        self.active.fetch_add(1, Ordering::Relaxed);
        StreamSession {
            active: self.active.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// Counts as one active viewer until dropped
#[derive(Debug)]
pub struct StreamSession {
    active: Arc<AtomicUsize>,
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

enum Phase {
    NeedFrame,
    HeaderPending { header: Vec<u8>, frame: FrameBuffer },
    BodyPending { frame: FrameBuffer, offset: usize },
    TerminatorPending,
}

/// One viewer's stream. Owns at most one frame at a time.
pub struct StreamEncoder {
    source: Arc<dyn FrameSource>,
    phase: Phase,
    frames_sent: u64,
    closed: bool,
    _session: StreamSession,
}

impl StreamEncoder {
    pub fn new(source: Arc<dyn FrameSource>, session: StreamSession) -> Self {
        Self {
            source,
            phase: Phase::NeedFrame,
            frames_sent: 0,
            closed: false,
            _session: session,
        }
    }

    /// Fill `buf` with the next stream bytes and return how many were written.
    ///
    /// Headers are written whole or not at all. At most one frame completes
    /// per call and its buffer is released before returning.
    pub fn produce(&mut self, buf: &mut [u8]) -> usize {
        if self.closed {
            return 0;
        }

        let mut written = 0;
        loop {
            let space = buf.len() - written;
            match std::mem::replace(&mut self.phase, Phase::NeedFrame) {
                Phase::NeedFrame => match self.source.capture_frame() {
                    Some(frame) => {
                        let header = part_header(frame.len()).into_bytes();
                        self.phase = Phase::HeaderPending { header, frame };
                    }
                    None => return written,
                },
                Phase::HeaderPending { header, frame } => {
                    if space < header.len() {
                        self.phase = Phase::HeaderPending { header, frame };
                        return written;
                    }
                    buf[written..written + header.len()].copy_from_slice(&header);
                    written += header.len();
                    self.phase = Phase::BodyPending { frame, offset: 0 };
                }
                Phase::BodyPending { frame, offset } => {
                    let n = (frame.len() - offset).min(space);
                    buf[written..written + n]
                        .copy_from_slice(&frame.as_bytes()[offset..offset + n]);
                    written += n;
                    if offset + n < frame.len() {
                        self.phase = Phase::BodyPending {
                            frame,
                            offset: offset + n,
                        };
                        return written;
                    }
                    drop(frame);
                    self.phase = Phase::TerminatorPending;
                }
                Phase::TerminatorPending => {
                    if space < TERMINATOR.len() {
                        self.phase = Phase::TerminatorPending;
                        return written;
                    }
                    buf[written..written + TERMINATOR.len()].copy_from_slice(TERMINATOR);
                    written += TERMINATOR.len();
                    self.frames_sent += 1;
                    return written;
                }
            }
        }
    }

    /// Release any held frame; later calls produce nothing
    pub fn close(&mut self) {
        self.phase = Phase::NeedFrame;
        self.closed = true;
    }

    pub fn holds_frame(&self) -> bool {
        matches!(
            self.phase,
            Phase::HeaderPending { .. } | Phase::BodyPending { .. }
        )
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}

/// Wrap an encoder as an HTTP body. Dropping the body (viewer gone) drops
/// the encoder and with it any held frame and the session.
pub fn stream_body(encoder: StreamEncoder, chunk_size: usize, poll: Duration) -> Body {
    let chunk_size = chunk_size.max(min_chunk_size());
    let stream = futures::stream::unfold(encoder, move |mut encoder| async move {
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = encoder.produce(&mut buf);
            if n > 0 {
                buf.truncate(n);
                return Some((Ok::<_, std::io::Error>(Bytes::from(buf)), encoder));
            }
            tokio::time::sleep(poll).await;
        }
    });
    Body::from_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::CountingFrames;

    fn encoder(frame_len: usize) -> (StreamEncoder, Arc<CountingFrames>, SessionCounter) {
        let frames = Arc::new(CountingFrames::new(frame_len));
        let sessions = SessionCounter::new();
        let encoder = StreamEncoder::new(frames.clone(), sessions.open());
        (encoder, frames, sessions)
    }

    #[test]
    fn test_small_buffer_defers_whole_header() {
        let (mut encoder, frames, _) = encoder(100);
        let header_len = part_header(100).len();

        let mut tiny = vec![0u8; header_len - 1];
        assert_eq!(encoder.produce(&mut tiny), 0);
        assert!(encoder.holds_frame());

        let mut exact = vec![0u8; header_len];
        assert_eq!(encoder.produce(&mut exact), header_len);
        assert_eq!(exact, part_header(100).into_bytes());
        assert_eq!(frames.captured(), 1);
    }

    #[test]
    fn test_bytes_per_frame() {
        let (mut encoder, frames, _) = encoder(1_000);
        let expected = part_header(1_000).len() + 1_000 + 2;

        let mut out = Vec::new();
        let mut buf = vec![0u8; 256];
        while encoder.frames_sent() == 0 {
            let n = encoder.produce(&mut buf);
            out.extend_from_slice(&buf[..n]);
        }

        assert_eq!(out.len(), expected);
        assert!(out.starts_with(b"--pyramid_frame\r\nContent-Type: image/jpeg\r\nContent-Length: 1000\r\n\r\n"));
        assert!(out.ends_with(b"\r\n"));
        assert_eq!(frames.released(), 1);
    }

    #[test]
    fn test_one_frame_per_call() {
        let (mut encoder, frames, _) = encoder(10);
        let mut big = vec![0u8; 64 * 1024];

        let n = encoder.produce(&mut big);
        assert_eq!(n, part_header(10).len() + 10 + 2);
        assert_eq!(frames.captured(), 1);
        assert_eq!(frames.released(), 1);
        assert!(!encoder.holds_frame());
    }

    #[test]
    fn test_terminator_waits_for_space() {
        let (mut encoder, frames, _) = encoder(4);
        let header_len = part_header(4).len();

        let mut buf = vec![0u8; header_len + 4 + 1];
        assert_eq!(encoder.produce(&mut buf), header_len + 4);
        assert_eq!(frames.released(), 1);
        assert_eq!(encoder.frames_sent(), 0);

        let mut two = [0u8; 2];
        assert_eq!(encoder.produce(&mut two), 2);
        assert_eq!(&two, b"\r\n");
        assert_eq!(encoder.frames_sent(), 1);
    }

    #[test]
    fn test_no_frame_is_no_progress() {
        let (mut encoder, frames, _) = encoder(10);
        frames.available.store(false, Ordering::SeqCst);

        let mut buf = vec![0u8; 512];
        assert_eq!(encoder.produce(&mut buf), 0);
        assert_eq!(encoder.produce(&mut buf), 0);

        frames.available.store(true, Ordering::SeqCst);
        assert!(encoder.produce(&mut buf) > 0);
    }

    #[test]
    fn test_disconnect_mid_frame_releases_once() {
        let (mut encoder, frames, sessions) = encoder(500);
        assert_eq!(sessions.active(), 1);

        let mut buf = vec![0u8; part_header(500).len() + 100];
        encoder.produce(&mut buf);
        assert!(encoder.holds_frame());
        assert_eq!(frames.released(), 0);

        drop(encoder);
        assert_eq!(frames.released(), 1);
        assert_eq!(sessions.active(), 0);
    }

    #[test]
    fn test_close_releases_and_stops() {
        let (mut encoder, frames, _) = encoder(500);
        let mut buf = vec![0u8; 200];
        encoder.produce(&mut buf);

        encoder.close();
        assert_eq!(frames.released(), frames.captured());
        assert_eq!(encoder.produce(&mut buf), 0);
        assert_eq!(frames.captured(), 1);
    }

    #[test]
    fn test_every_frame_released_across_a_stream() {
        let (mut encoder, frames, _) = encoder(300);
        let mut buf = vec![0u8; 128];
        while encoder.frames_sent() < 5 {
            encoder.produce(&mut buf);
        }
        drop(encoder);
        assert_eq!(frames.captured(), frames.released());
    }

    #[test]
    fn test_min_chunk_fits_any_header() {
        let (mut encoder, frames, _) = encoder(300);
        assert!(part_header(usize::from(u16::MAX)).len() < min_chunk_size());

        let mut buf = vec![0u8; min_chunk_size()];
        for _ in 0..100 {
            encoder.produce(&mut buf);
        }
        assert!(encoder.frames_sent() >= 3);
        assert!(frames.released() >= 3);
    }

    #[tokio::test]
    async fn test_body_raises_undersized_chunk() {
        use futures_util::StreamExt;

        let (encoder, _, _) = encoder(100);
        let body = stream_body(encoder, 8, Duration::from_millis(1));
        let mut data = body.into_data_stream();

        let first = data.next().await.unwrap().unwrap();
        assert_eq!(first.len(), min_chunk_size());
        assert!(first.starts_with(part_header(100).as_bytes()));
    }
}
