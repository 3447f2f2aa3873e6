// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Camera node
//!
//! One detection loop (thermal check, capture, classify, debounce) is the
//! single writer of the node's health and state. Viewers pull MJPEG over
//! HTTP independently; heartbeats go out on their own timer.

mod state;
mod thermal;
mod health;
mod debounce;
mod kernel;
mod stream;
mod uplink;
mod api;

pub use state::{Detection, NodeState};
pub use thermal::{ThermalBand, ThermalGovernor};
pub use health::{CameraHealth, CameraStatus};
pub use debounce::DetectionDebouncer;
pub use kernel::{CameraCapabilities, CycleReport, DetectionKernel};
pub use stream::{
    min_chunk_size, part_header, stream_body, SessionCounter, StreamEncoder, StreamSession, BOUNDARY,
    STREAM_CONTENT_TYPE,
};
pub use uplink::UplinkClient;
pub use api::CameraApi;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::CameraConfig;
use crate::core::{Clock, Scheduler};
use crate::protocol::{DatagramTransport, MessageTransport, TransportRouter, UplinkMessage};

pub struct CameraNode {
    config: CameraConfig,
    caps: CameraCapabilities,
    health: Arc<CameraHealth>,
    sessions: SessionCounter,
    kernel: Arc<Mutex<DetectionKernel>>,
    uplink: Arc<UplinkClient>,
    scheduler: Scheduler,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Option<Instant>,
}

impl CameraNode {
    pub fn new(config: CameraConfig, caps: CameraCapabilities, clock: Arc<dyn Clock>) -> Self {
        let health = Arc::new(CameraHealth::new(config.cam_id, clock));
        let sessions = SessionCounter::new();
        let kernel = DetectionKernel::new(
            &config.sector,
            caps.clone(),
            ThermalGovernor::new(&config),
            DetectionDebouncer::new(config.confirm_threshold),
            health.clone(),
            sessions.clone(),
        );
        let uplink = Arc::new(UplinkClient::new(
            config.hub_ws_url(),
            Duration::from_millis(config.reconnect_interval_ms),
        ));
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            config,
            caps,
            health,
            sessions,
            kernel: Arc::new(Mutex::new(kernel)),
            uplink,
            scheduler: Scheduler::new(),
            shutdown_tx,
            start_time: None,
        }
    }

    async fn datagram_transport(&self) -> Result<Option<Arc<dyn MessageTransport>>> {
        if !self.config.datagram_enabled {
            return Ok(None);
        }
        let host = (self.config.hub_host.as_str(), self.config.hub_datagram_port);
        let target = tokio::net::lookup_host(host)
            .await?
            .next()
            .ok_or_else(|| anyhow!("cannot resolve hub host {}", self.config.hub_host))?;
        let transport: Arc<dyn MessageTransport> =
            Arc::new(DatagramTransport::bind(target, self.config.datagram_broadcast).await?);
        Ok(Some(transport))
    }

    /// Start every task. Returns the bound HTTP address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        info!("Starting camera node...");
        self.start_time = Some(Instant::now());

        let bus: Arc<dyn MessageTransport> = self.uplink.clone();
        let router = Arc::new(TransportRouter::new(bus, self.datagram_transport().await?));

        info!("Uplink target {}", self.uplink.url());
        let uplink = self.uplink.clone();
        let shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move { uplink.run(shutdown).await });

        let listener = TcpListener::bind(self.config.http_addr()).await?;
        let http = listener.local_addr()?;
        let api = CameraApi::new(
            self.health.clone(),
            self.caps.frames.clone(),
            self.sessions.clone(),
            self.config.stream_chunk_size,
            Duration::from_millis(self.config.stream_poll_ms),
        );
        let shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = api.serve(listener, shutdown).await {
                error!("Camera HTTP server failed: {}", e);
            }
        });

        let heartbeat_router = router.clone();
        let health = self.health.clone();
        self.scheduler.add_task(
            "heartbeat",
            Duration::from_millis(self.config.heartbeat_interval_ms),
            move || {
                let router = heartbeat_router.clone();
                let message = UplinkMessage::Heartbeat(health.telemetry());
                async move {
                    router.dispatch(&message).await;
                }
            },
        );

        tokio::spawn(detection_loop(
            self.kernel.clone(),
            router,
            self.shutdown_tx.subscribe(),
        ));

        info!("----------------------------------------");
        info!(" SECTORWATCH CAMERA NODE INITIALIZED ");
        info!(" SECTOR: {} | NODE: {}", self.config.sector, self.config.cam_id);
        info!("----------------------------------------");
        Ok(http)
    }

    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping camera node...");
        self.scheduler.shutdown();
        let _ = self.shutdown_tx.send(());
        info!("Camera node stopped");
        Ok(())
    }

    pub fn health(&self) -> &Arc<CameraHealth> {
        &self.health
    }

    pub fn uplink(&self) -> &Arc<UplinkClient> {
        &self.uplink
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }
}

async fn detection_loop(
    kernel: Arc<Mutex<DetectionKernel>>,
    router: Arc<TransportRouter>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let cycle_kernel = kernel.clone();
        let report = match tokio::task::spawn_blocking(move || cycle_kernel.lock().run_cycle()).await {
            Ok(report) => report,
            Err(e) => {
                error!("Detection cycle panicked: {}", e);
                return;
            }
        };

        if let Some(alert) = &report.alert {
            let delivery = router.dispatch(alert).await;
            if !delivery.bus {
                info!("Alert not delivered over the bus (hub unreachable)");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(report.next_delay) => {}
            _ = shutdown.recv() => break,
        }
    }
}
