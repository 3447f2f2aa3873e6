// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Coordinator node
//!
//! The hub owns the system state. Two paths mutate it under one lock: the
//! fusion cycle on the blocking pool and the network surfaces (bus, datagram
//! listener, HTTP, panel button).

mod presence;
mod state;
mod fusion;
mod dispatch;
mod server;
mod api;
mod panel;

pub use presence::{PresenceTracker, SectorPresence, SectorStatus, SECTOR_COUNT};
pub use state::{HubState, Journal, SharedState, SystemState, MAX_THREAT, MIN_THREAT};
pub use fusion::{FusionEngine, FusionReport, HubSensors, BREACH_EVENT};
pub use dispatch::Dispatcher;
pub use server::{BusServer, DatagramListener};
pub use api::HubApi;
pub use panel::ArmPanel;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::HubConfig;
use crate::core::{Clock, Scheduler, StateBus};
use crate::eventlog::EventLog;
use crate::sensors::ArmSwitch;

/// Addresses the hub actually bound
#[derive(Debug, Clone, Copy)]
pub struct HubEndpoints {
    pub bus: SocketAddr,
    pub datagram: SocketAddr,
    pub http: SocketAddr,
}

pub struct Hub {
    config: HubConfig,
    clock: Arc<dyn Clock>,
    log: Arc<dyn EventLog>,
    state: Arc<SharedState>,
    bus: Arc<StateBus>,
    dispatcher: Arc<Dispatcher>,
    fusion: Arc<FusionEngine>,
    switch: Arc<dyn ArmSwitch>,
    scheduler: Scheduler,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Option<Instant>,
}

impl Hub {
    pub fn new(
        config: HubConfig,
        sensors: HubSensors,
        switch: Arc<dyn ArmSwitch>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let fusion_config = config.fusion.clone();
        let state = Arc::new(SharedState::new(
            SystemState::boot(config.start_armed),
            PresenceTracker::new(fusion_config.presence_window_ms, fusion_config.breach_window_ms),
        ));
        let bus = Arc::new(StateBus::new(64));
        let dispatcher = Arc::new(Dispatcher::new(
            &fusion_config,
            state.clone(),
            clock.clone(),
            sensors.actuator.clone(),
            log.clone(),
        ));
        let fusion = Arc::new(FusionEngine::new(
            fusion_config,
            state.clone(),
            sensors,
            clock.clone(),
            bus.clone(),
            log.clone(),
        ));
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            config,
            clock,
            log,
            state,
            bus,
            dispatcher,
            fusion,
            switch,
            scheduler: Scheduler::new(),
            shutdown_tx,
            start_time: None,
        }
    }

    pub async fn start(&mut self) -> Result<HubEndpoints> {
        info!("Starting hub...");
        self.start_time = Some(Instant::now());

        let bus_server = BusServer::new(
            self.config.ws_addr(),
            self.config.max_ws_clients,
            self.bus.clone(),
            self.dispatcher.clone(),
        );
        let bus = bus_server.start(self.shutdown_tx.subscribe()).await?;

        let datagram = DatagramListener::new(self.config.datagram_addr(), self.dispatcher.clone())
            .start(self.shutdown_tx.subscribe())
            .await?;

        let listener = TcpListener::bind(self.config.http_addr()).await?;
        let http = listener.local_addr()?;
        let api = HubApi::new(self.dispatcher.clone(), self.clock.clone());
        let shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = api.serve(listener, shutdown).await {
                error!("Hub HTTP server failed: {}", e);
            }
        });

        let panel = ArmPanel::new(
            self.switch.clone(),
            self.dispatcher.clone(),
            Duration::from_millis(self.config.panel_interval_ms),
        );
        tokio::spawn(panel.run(self.shutdown_tx.subscribe()));

        let fusion = self.fusion.clone();
        self.scheduler
            .add_blocking_task("fusion", self.config.fusion.tick(), move || {
                fusion.run_cycle();
            });

        let mut journal = Journal::default();
        self.state
            .apply(|hub| journal.record(&mut hub.system, "KERNEL_FULLY_DEPLOYED"));
        journal.flush(self.log.as_ref());

        info!("Hub started");
        Ok(HubEndpoints {
            bus,
            datagram,
            http,
        })
    }

    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping hub...");
        self.scheduler.shutdown();
        let _ = self.shutdown_tx.send(());
        info!("Hub stopped");
        Ok(())
    }

    pub fn state(&self) -> HubState {
        self.state.snapshot()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }
}
