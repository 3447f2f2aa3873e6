// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Camera HTTP surface

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use super::{stream_body, CameraHealth, CameraStatus, SessionCounter, StreamEncoder, STREAM_CONTENT_TYPE};
use crate::sensors::FrameSource;

#[derive(Clone)]
pub struct CameraApi {
    health: Arc<CameraHealth>,
    frames: Arc<dyn FrameSource>,
    sessions: SessionCounter,
    chunk_size: usize,
    poll: Duration,
}

impl CameraApi {
    pub fn new(
        health: Arc<CameraHealth>,
        frames: Arc<dyn FrameSource>,
        sessions: SessionCounter,
        chunk_size: usize,
        poll: Duration,
    ) -> Self {
        Self {
            health,
            frames,
            sessions,
            chunk_size,
            poll,
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/stream", get(stream))
            .route("/status", get(status))
            .route("/capture", post(capture))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self)
    }

    pub async fn serve(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("Camera HTTP listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;
        Ok(())
    }
}

async fn stream(State(api): State<CameraApi>) -> Response {
    let encoder = StreamEncoder::new(api.frames.clone(), api.sessions.open());
    debug!("Stream opened, {} active", api.sessions.active());
    (
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        stream_body(encoder, api.chunk_size, api.poll),
    )
        .into_response()
}

async fn status(State(api): State<CameraApi>) -> Json<CameraStatus> {
    Json(api.health.status())
}

async fn capture(State(api): State<CameraApi>) -> Response {
    match api.frames.capture_frame() {
        Some(frame) => {
            debug!(
                "One-shot capture: {}x{}, {} bytes",
                frame.width(),
                frame.height(),
                frame.len()
            );
            drop(frame);
            Json(json!({"status": "ok"})).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "failed"})),
        )
            .into_response(),
    }
}
