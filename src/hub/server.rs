// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Hub network listeners: WebSocket bus and UDP datagrams

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::Dispatcher;
use crate::core::StateBus;
use crate::protocol::StateBroadcast;

type ClientMap = Arc<RwLock<HashMap<String, SocketAddr>>>;

/// WebSocket pub/sub bus.
///
/// Every client receives each fusion snapshot and may send commands and
/// alerts back.
pub struct BusServer {
    addr: SocketAddr,
    max_clients: usize,
    clients: ClientMap,
    bus: Arc<StateBus>,
    dispatcher: Arc<Dispatcher>,
}

impl BusServer {
    pub fn new(
        addr: SocketAddr,
        max_clients: usize,
        bus: Arc<StateBus>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            addr,
            max_clients,
            clients: Arc::new(RwLock::new(HashMap::new())),
            bus,
            dispatcher,
        }
    }

    /// Bind and spawn the accept loop. Returns the bound address.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local = listener.local_addr()?;

        info!("Bus listening on ws://{}", local);

        let clients = self.clients.clone();
        let max_clients = self.max_clients;
        let bus = self.bus.clone();
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, addr)) => {
                                if clients.read().await.len() >= max_clients {
                                    warn!("Max clients reached, rejecting connection from {}", addr);
                                    continue;
                                }

                                tokio::spawn(handle_connection(
                                    stream,
                                    addr,
                                    clients.clone(),
                                    bus.subscribe(),
                                    dispatcher.clone(),
                                ));
                            }
                            Err(e) => {
                                error!("Accept error: {}", e);
                            }
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("Bus shutting down");
                        break;
                    }
                }
            }
        });

        Ok(local)
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    clients: ClientMap,
    mut snapshots: broadcast::Receiver<StateBroadcast>,
    dispatcher: Arc<Dispatcher>,
) {
    let client_id = uuid::Uuid::new_v4().to_string();

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };

    info!("Bus client connected from {} (id: {})", addr, client_id);
    clients.write().await.insert(client_id.clone(), addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let welcome = serde_json::json!({
        "type": "welcome",
        "client_id": client_id,
        "server": crate::NAME,
        "version": crate::VERSION,
    });
    if let Err(e) = ws_sender.send(Message::Text(welcome.to_string())).await {
        warn!("Failed to send welcome: {}", e);
    }

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received from {}: {}", addr, text);
                        if is_ping(&text) {
                            let pong = serde_json::json!({"type": "pong"});
                            let _ = ws_sender.send(Message::Text(pong.to_string())).await;
                        } else {
                            dispatcher.handle_text(&text);
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Bus closed by client {}", addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            snapshot = snapshots.recv() => {
                match snapshot {
                    Ok(snapshot) => {
                        if let Err(e) = ws_sender.send(Message::Text(snapshot.to_json())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Client {} lagged, skipped {} snapshots", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    clients.write().await.remove(&client_id);
    info!("Bus client {} disconnected", addr);
}

fn is_ping(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|t| t == "ping"))
        .unwrap_or(false)
}

/// UDP listener for camera datagrams
pub struct DatagramListener {
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
}

impl DatagramListener {
    pub fn new(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> Self {
        Self { addr, dispatcher }
    }

    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<SocketAddr> {
        let socket = UdpSocket::bind(self.addr).await?;
        let local = socket.local_addr()?;
        info!("Datagram listener on udp://{}", local);

        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            loop {
                tokio::select! {
                    received = socket.recv_from(&mut buf) => {
                        match received {
                            Ok((len, from)) => {
                                debug!("Datagram from {} ({} bytes)", from, len);
                                dispatcher.handle_datagram(&buf[..len]);
                            }
                            Err(e) => warn!("Datagram receive error: {}", e),
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("Datagram listener shutting down");
                        break;
                    }
                }
            }
        });

        Ok(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::core::ManualClock;
    use crate::eventlog::MemoryEventLog;
    use crate::hub::{PresenceTracker, SharedState, SystemState};
    use crate::protocol::DatagramRecord;
    use crate::sensors::testing::RecordingActuator;
    use std::time::Duration;

    fn dispatcher() -> Arc<Dispatcher> {
        let clock = Arc::new(ManualClock::new(0));
        let state = Arc::new(SharedState::new(
            SystemState::boot(true),
            PresenceTracker::default(),
        ));
        Arc::new(Dispatcher::new(
            &FusionConfig::default(),
            state,
            clock.clone(),
            Arc::new(RecordingActuator::default()),
            Arc::new(MemoryEventLog::new(clock)),
        ))
    }

    async fn next_text<S>(stream: &mut S) -> serde_json::Value
    where
        S: futures_util::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("stream ended: {:?}", other),
            }
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met");
    }

    #[tokio::test]
    async fn test_bus_round_trip() {
        let dispatcher = dispatcher();
        let bus = Arc::new(StateBus::new(16));
        let server = BusServer::new(
            "127.0.0.1:0".parse().unwrap(),
            4,
            bus.clone(),
            dispatcher.clone(),
        );
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let addr = server.start(shutdown_rx).await.unwrap();

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", addr))
            .await
            .unwrap();
        assert_eq!(next_text(&mut ws).await["type"], "welcome");

        ws.send(Message::Text(r#"{"type":"ping"}"#.to_string()))
            .await
            .unwrap();
        assert_eq!(next_text(&mut ws).await["type"], "pong");

        ws.send(Message::Text(
            r#"{"event":"alert","cam_id":2,"type":"HUMAN_TARGET","sector":"SOUTH"}"#.to_string(),
        ))
        .await
        .unwrap();
        let state = dispatcher.state().clone();
        wait_for(|| state.snapshot().system.threat_level == 20).await;

        bus.publish(state.broadcast());
        let frame = next_text(&mut ws).await;
        assert_eq!(frame["event"], "state_update");
        assert_eq!(frame["threat"], 20);
        assert_eq!(server.client_count().await, 1);
    }

    #[tokio::test]
    async fn test_datagram_listener_feeds_presence() {
        let dispatcher = dispatcher();
        let listener = DatagramListener::new("127.0.0.1:0".parse().unwrap(), dispatcher.clone());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let addr = listener.start(shutdown_rx).await.unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let record = DatagramRecord::heartbeat(3, 51.0, 2048).encode().unwrap();
        sender.send_to(&record, addr).await.unwrap();
        sender.send_to(b"short", addr).await.unwrap();

        let state = dispatcher.state().clone();
        wait_for(|| state.snapshot().presence.is_online(3, 0)).await;
        assert_eq!(state.snapshot().system.threat_level, 0);
    }
}
