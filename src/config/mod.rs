// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Use simulated sensors and actuators
    pub demo_mode: bool,

    /// Coordinator node configuration
    pub hub: HubConfig,

    /// Camera node configuration
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "SectorWatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            demo_mode: true,
            hub: HubConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Reject values the nodes cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.camera.cam_id) {
            return Err(anyhow!(
                "camera.cam_id must be within 1..=4, got {}",
                self.camera.cam_id
            ));
        }
        if self.hub.fusion.tick_ms == 0 {
            return Err(anyhow!("hub.fusion.tick_ms must be positive"));
        }
        let min_chunk = crate::camera::min_chunk_size();
        if self.camera.stream_chunk_size < min_chunk {
            return Err(anyhow!(
                "camera.stream_chunk_size must be at least {} bytes, got {}",
                min_chunk,
                self.camera.stream_chunk_size
            ));
        }
        if self.camera.warm_temp_c > self.camera.critical_temp_c {
            return Err(anyhow!(
                "camera.warm_temp_c ({}) is above camera.critical_temp_c ({})",
                self.camera.warm_temp_c,
                self.camera.critical_temp_c
            ));
        }
        Ok(())
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("sectorwatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Coordinator node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Address every hub listener binds to
    pub bind_addr: IpAddr,

    /// WebSocket bus port
    pub ws_port: u16,

    /// HTTP status/arm port
    pub http_port: u16,

    /// UDP datagram listener port
    pub datagram_port: u16,

    /// Maximum concurrent bus clients
    pub max_ws_clients: usize,

    /// Armed state at boot
    pub start_armed: bool,

    /// Event log file
    pub log_path: PathBuf,

    /// Panel button poll interval
    pub panel_interval_ms: u64,

    /// Fusion thresholds and deltas
    pub fusion: FusionConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            ws_port: 8181,
            http_port: 8080,
            datagram_port: 4210,
            max_ws_clients: 16,
            start_armed: true,
            log_path: PathBuf::from("./data/hub_events.log"),
            panel_interval_ms: 250,
            fusion: FusionConfig::default(),
        }
    }
}

impl HubConfig {
    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.ws_port)
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }

    pub fn datagram_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.datagram_port)
    }
}

/// Threat fusion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Fusion cycle period
    pub tick_ms: u64,

    /// Objects closer than this (cm) count as proximity evidence
    pub proximity_threshold_cm: f32,

    /// Threat added by proximity evidence
    pub proximity_delta: i32,

    /// Threat added by local motion
    pub motion_delta: i32,

    /// Threat added per remote alert
    pub remote_alert_delta: i32,

    /// Threat removed per cycle
    pub decay: i32,

    /// Threat above which the alarm sounds
    pub alarm_threshold: i32,

    /// Window in which alerts from distinct sectors count as one breach
    pub breach_window_ms: u64,

    /// Distinct alerting sectors that make a breach
    pub breach_min_sectors: usize,

    /// Heartbeat age after which a sector is offline
    pub presence_window_ms: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            tick_ms: 300,
            proximity_threshold_cm: 30.0,
            proximity_delta: 10,
            motion_delta: 15,
            remote_alert_delta: 20,
            decay: 1,
            alarm_threshold: 80,
            breach_window_ms: 10_000,
            breach_min_sectors: 2,
            presence_window_ms: 10_000,
        }
    }
}

impl FusionConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Camera node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Sector id, 1..=4
    pub cam_id: i32,

    /// Sector label carried in alerts
    pub sector: String,

    /// Hub host name or address
    pub hub_host: String,

    /// Hub WebSocket bus port
    pub hub_ws_port: u16,

    /// Hub datagram port
    pub hub_datagram_port: u16,

    /// Send heartbeats and alert mirrors over UDP
    pub datagram_enabled: bool,

    /// Send datagrams to the broadcast address
    pub datagram_broadcast: bool,

    /// Address the camera HTTP surface binds to
    pub bind_addr: IpAddr,

    /// Camera HTTP port
    pub http_port: u16,

    /// Above this the node cools down and skips detection
    pub critical_temp_c: f32,

    /// Upper bound of the nominal band
    pub warm_temp_c: f32,

    /// Above this the detection interval is stretched
    pub throttle_temp_c: f32,

    /// Detection interval while analyzing
    pub analyzing_interval_ms: u64,

    /// Detection interval otherwise
    pub idle_interval_ms: u64,

    /// Interval added above the throttle temperature
    pub throttle_penalty_ms: u64,

    /// Interval added while any stream is open
    pub stream_penalty_ms: u64,

    /// Pause added after a critical reading
    pub cooling_pause_ms: u64,

    /// Heartbeat period
    pub heartbeat_interval_ms: u64,

    /// Delay between uplink connection attempts
    pub reconnect_interval_ms: u64,

    /// Maximum body chunk per stream write
    pub stream_chunk_size: usize,

    /// Wait before retrying a stream write that made no progress
    pub stream_poll_ms: u64,

    /// Consecutive positives required for an alert
    pub confirm_threshold: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            cam_id: 1,
            sector: "NORTH".to_string(),
            hub_host: "127.0.0.1".to_string(),
            hub_ws_port: 8181,
            hub_datagram_port: 4210,
            datagram_enabled: true,
            datagram_broadcast: false,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            http_port: 8090,
            critical_temp_c: 82.0,
            warm_temp_c: 72.0,
            throttle_temp_c: 75.0,
            analyzing_interval_ms: 100,
            idle_interval_ms: 350,
            throttle_penalty_ms: 200,
            stream_penalty_ms: 150,
            cooling_pause_ms: 1_000,
            heartbeat_interval_ms: 5_000,
            reconnect_interval_ms: 5_000,
            stream_chunk_size: 4_096,
            stream_poll_ms: 20,
            confirm_threshold: 2,
        }
    }
}

impl CameraConfig {
    pub fn hub_ws_url(&self) -> String {
        format!("ws://{}:{}/", self.hub_host, self.hub_ws_port)
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}
