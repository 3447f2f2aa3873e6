// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Persistent WebSocket link from a camera node to the hub bus

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{MessageTransport, UplinkMessage};

const OUTBOUND_CAPACITY: usize = 32;

/// Fire-and-forget uplink.
///
/// While connected, sends go through a small channel to the socket task.
/// While disconnected, sends fail immediately. Nothing survives a
/// disconnect.
pub struct UplinkClient {
    url: String,
    reconnect_interval: Duration,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
}

impl UplinkClient {
    pub fn new(url: impl Into<String>, reconnect_interval: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_interval,
            outbound: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.lock().is_some()
    }

    /// Connect, serve, reconnect at a fixed interval until shutdown
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!("COMM_LINK::STABLE - connected to {}", self.url);
                    let stopped = self.serve(ws, &mut shutdown).await;
                    if stopped {
                        return;
                    }
                    warn!("COMM_LINK::LOST - {}", self.url);
                }
                Err(e) => {
                    debug!("Uplink connect to {} failed: {}", self.url, e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_interval) => {}
                _ = shutdown.recv() => return,
            }
        }
    }

    /// Returns true when shutdown was requested
    async fn serve(
        &self,
        ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> bool {
        let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        *self.outbound.lock() = Some(tx);

        let (mut sink, mut stream) = ws.split();
        let stopped = loop {
            tokio::select! {
                Some(text) = rx.recv() => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Uplink send failed: {}", e);
                        break false;
                    }
                }
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => debug!("COMMAND_RX: {}", text),
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break false,
                        Some(Err(e)) => {
                            warn!("Uplink error: {}", e);
                            break false;
                        }
                        _ => {}
                    }
                }
                _ = shutdown.recv() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break true;
                }
            }
        };

        // Anything still queued is dropped with the channel
        *self.outbound.lock() = None;
        stopped
    }
}

#[async_trait]
impl MessageTransport for UplinkClient {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn is_available(&self) -> bool {
        self.is_connected()
    }

    async fn send(&self, message: &UplinkMessage) -> Result<()> {
        let tx = self
            .outbound
            .lock()
            .clone()
            .ok_or_else(|| Error::Transport("uplink disconnected".into()))?;
        tx.try_send(message.to_json())
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
