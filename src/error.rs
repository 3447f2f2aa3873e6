// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Crate error type

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the protocol and transport layers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Datagram record could not be decoded
    #[error("Malformed datagram: {0}")]
    Datagram(String),

    /// Transport is not able to carry the message right now
    #[error("Transport unavailable: {0}")]
    Transport(String),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Binary codec error
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),
}
