// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! SectorWatch - Distributed Sector Security Network
//!
//! Runs either node type of the network:
//! - `hub`: threat fusion, arm/disarm, WebSocket bus, datagram listener, HTTP status
//! - `camera`: sector detection kernel, MJPEG stream, uplink to the hub

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sectorwatch::camera::{CameraCapabilities, CameraNode};
use sectorwatch::eventlog::FileEventLog;
use sectorwatch::hub::{Hub, HubSensors};
use sectorwatch::sensors::simulator::{
    IdleSwitch, LoggingActuator, MarkerClassifier, SimulatedCamera, SimulatedPir,
    SimulatedRangeFinder, SimulatedThermistor,
};
use sectorwatch::sensors::SystemMemory;
use sectorwatch::{Clock, Config, MonotonicClock, VERSION};

/// SectorWatch - Distributed Sector Security Network
#[derive(Parser, Debug)]
#[command(name = "sectorwatch")]
#[command(author = "bad-antics")]
#[command(version = VERSION)]
#[command(about = "Hub threat fusion and camera node kernel for a four-sector security network")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with simulated sensors
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    node: Node,
}

#[derive(Subcommand, Debug)]
enum Node {
    /// Run the coordinator hub
    Hub {
        /// Start disarmed
        #[arg(long)]
        disarmed: bool,

        /// Event log file
        #[arg(long)]
        log_path: Option<PathBuf>,
    },

    /// Run a camera node
    Camera {
        /// Sector id (1-4)
        #[arg(long)]
        cam_id: Option<i32>,

        /// Sector label
        #[arg(long)]
        sector: Option<String>,

        /// Hub host name or address
        #[arg(long)]
        hub: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("SectorWatch v{} - Distributed Sector Security Network", VERSION);

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    if args.demo {
        config.demo_mode = true;
    }

    match &args.node {
        Node::Hub { disarmed, log_path } => {
            if *disarmed {
                config.hub.start_armed = false;
            }
            if let Some(path) = log_path {
                config.hub.log_path = path.clone();
            }
        }
        Node::Camera { cam_id, sector, hub } => {
            if let Some(id) = cam_id {
                config.camera.cam_id = *id;
            }
            if let Some(sector) = sector {
                config.camera.sector = sector.clone();
            }
            if let Some(host) = hub {
                config.camera.hub_host = host.clone();
            }
        }
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    if !config.demo_mode {
        bail!("No hardware drivers are built into this binary. Run with --demo");
    }

    let rt = tokio::runtime::Runtime::new()?;
    match args.node {
        Node::Hub { .. } => rt.block_on(run_hub(config)),
        Node::Camera { .. } => rt.block_on(run_camera(config)),
    }
}

async fn run_hub(config: Config) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let log = Arc::new(FileEventLog::open(&config.hub.log_path, clock.clone())?);
    info!("Event log at {:?}", log.path());

    let sensors = HubSensors {
        distance: Arc::new(SimulatedRangeFinder::new()),
        motion: Arc::new(SimulatedPir::new(0.01)),
        temperature: Arc::new(SimulatedThermistor::new(45.0, 30.0, 70.0)),
        actuator: Arc::new(LoggingActuator::new()),
    };

    let mut hub = Hub::new(config.hub, sensors, Arc::new(IdleSwitch), clock, log);
    let endpoints = hub.start().await?;

    info!("Hub running: bus ws://{} | datagram udp://{} | http://{}",
        endpoints.bus, endpoints.datagram, endpoints.http);
    info!("   Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, cleaning up...");
    hub.stop().await?;
    info!("SectorWatch hub shutdown complete after {}s", hub.uptime());
    Ok(())
}

async fn run_camera(config: Config) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let caps = CameraCapabilities {
        frames: Arc::new(SimulatedCamera::new(320, 240)),
        classifier: Arc::new(MarkerClassifier),
        temperature: Arc::new(SimulatedThermistor::new(55.0, 40.0, 88.0)),
        memory: Arc::new(SystemMemory::new()),
    };

    let mut node = CameraNode::new(config.camera, caps, clock);
    let http = node.start().await?;

    info!("Camera running: http://{}/stream", http);
    info!("   Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, cleaning up...");
    node.stop().await?;
    info!("SectorWatch camera shutdown complete after {}s", node.uptime());
    Ok(())
}
