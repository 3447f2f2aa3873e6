// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Hub HTTP surface

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{Dispatcher, SectorStatus};
use crate::core::Clock;

#[derive(Clone)]
pub struct HubApi {
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub armed: bool,
    pub threat: i32,
    pub prox: f32,
    pub temp: f32,
    pub log: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct SectorsResponse {
    pub sectors: Vec<SectorStatus>,
    pub multi_sector_breach: bool,
    pub system_offline: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArmQuery {
    state: Option<String>,
}

impl HubApi {
    pub fn new(dispatcher: Arc<Dispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self { dispatcher, clock }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/status", get(status))
            .route("/arm", get(arm))
            .route("/sectors", get(sectors))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self)
    }

    pub async fn serve(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("Hub HTTP listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;
        Ok(())
    }
}

async fn status(State(api): State<HubApi>) -> Json<StatusResponse> {
    let system = api.dispatcher.state().snapshot().system;
    Json(StatusResponse {
        armed: system.armed,
        threat: system.threat_level,
        prox: system.proximity,
        temp: system.core_temp,
        log: system.last_event,
        version: format!("v{}", crate::VERSION),
    })
}

async fn arm(State(api): State<HubApi>, Query(query): Query<ArmQuery>) -> Response {
    match query.state {
        Some(state) => {
            api.dispatcher.set_armed_remote(state == "1");
            Json(json!({"status": "ok"})).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "missing state"})),
        )
            .into_response(),
    }
}

async fn sectors(State(api): State<HubApi>) -> Json<SectorsResponse> {
    let now = api.clock.now_ms();
    let hub = api.dispatcher.state().snapshot();
    Json(SectorsResponse {
        sectors: hub.presence.statuses(now),
        multi_sector_breach: hub.system.multi_sector_breach,
        system_offline: hub.presence.system_offline(now, hub.system.proximity),
    })
}
