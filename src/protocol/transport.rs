// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Message transports and urgency-based routing

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::{UplinkMessage, Urgency};
use crate::error::Result;

/// A best-effort path from a camera node to the hub.
///
/// Implementations never buffer: a send that cannot go out now fails and the
/// message is gone.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a send right now has any chance of leaving the node
    fn is_available(&self) -> bool {
        true
    }

    async fn send(&self, message: &UplinkMessage) -> Result<()>;
}

/// Connectionless UDP sender carrying [`DatagramRecord`](super::DatagramRecord)s
pub struct DatagramTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl DatagramTransport {
    pub async fn bind(target: SocketAddr, broadcast: bool) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(broadcast)?;
        info!("Datagram uplink ready -> {}", target);
        Ok(Self { socket, target })
    }
}

#[async_trait]
impl MessageTransport for DatagramTransport {
    fn name(&self) -> &'static str {
        "datagram"
    }

    async fn send(&self, message: &UplinkMessage) -> Result<()> {
        let payload = message.to_datagram().encode()?;
        self.socket.send_to(&payload, self.target).await?;
        Ok(())
    }
}

/// Which backends accepted a routed message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub bus: bool,
    pub datagram: bool,
}

impl Delivery {
    pub fn any(&self) -> bool {
        self.bus || self.datagram
    }
}

/// Picks transports by message urgency.
///
/// Routine traffic takes the datagram path when one is configured and the bus
/// otherwise. Critical traffic goes over the bus and is mirrored on the
/// datagram path as a presence hint.
pub struct TransportRouter {
    bus: Arc<dyn MessageTransport>,
    datagram: Option<Arc<dyn MessageTransport>>,
}

impl TransportRouter {
    pub fn new(bus: Arc<dyn MessageTransport>, datagram: Option<Arc<dyn MessageTransport>>) -> Self {
        Self { bus, datagram }
    }

    pub async fn dispatch(&self, message: &UplinkMessage) -> Delivery {
        let mut delivery = Delivery::default();

        match (message.urgency(), &self.datagram) {
            (Urgency::Routine, Some(datagram)) => {
                delivery.datagram = Self::try_send(datagram.as_ref(), message).await;
            }
            (Urgency::Routine, None) => {
                delivery.bus = Self::try_send(self.bus.as_ref(), message).await;
            }
            (Urgency::Critical, datagram) => {
                delivery.bus = Self::try_send(self.bus.as_ref(), message).await;
                if let Some(datagram) = datagram {
                    delivery.datagram = Self::try_send(datagram.as_ref(), message).await;
                }
            }
        }

        delivery
    }

    async fn try_send(transport: &dyn MessageTransport, message: &UplinkMessage) -> bool {
        if !transport.is_available() {
            debug!("{} unavailable, dropping {:?}", transport.name(), message.urgency());
            return false;
        }
        match transport.send(message).await {
            Ok(()) => true,
            Err(e) => {
                debug!("{} send failed, dropping: {}", transport.name(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{AlertMessage, DatagramRecord, Telemetry, HUMAN_TARGET};
    use parking_lot::Mutex;

    struct RecordingTransport {
        name: &'static str,
        online: bool,
        sent: Mutex<Vec<UplinkMessage>>,
    }

    impl RecordingTransport {
        fn new(name: &'static str, online: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                online,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.online
        }

        async fn send(&self, message: &UplinkMessage) -> Result<()> {
            if !self.online {
                return Err(Error::Transport("offline".into()));
            }
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    fn telemetry() -> Telemetry {
        Telemetry {
            cam_id: 2,
            temperature: 48.0,
            free_memory: 4096,
        }
    }

    fn alert() -> UplinkMessage {
        UplinkMessage::Alert {
            alert: AlertMessage::new(2, HUMAN_TARGET, "SOUTH", Some(48.0)),
            telemetry: telemetry(),
        }
    }

    #[tokio::test]
    async fn test_heartbeat_prefers_datagram() {
        let bus = RecordingTransport::new("bus", true);
        let datagram = RecordingTransport::new("datagram", true);
        let router = TransportRouter::new(bus.clone(), Some(datagram.clone() as Arc<dyn MessageTransport>));

        let delivery = router.dispatch(&UplinkMessage::Heartbeat(telemetry())).await;

        assert_eq!(delivery, Delivery { bus: false, datagram: true });
        assert!(bus.sent.lock().is_empty());
        assert_eq!(datagram.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_falls_back_to_bus() {
        let bus = RecordingTransport::new("bus", true);
        let router = TransportRouter::new(bus.clone(), None);

        let delivery = router.dispatch(&UplinkMessage::Heartbeat(telemetry())).await;
        assert!(delivery.bus);
        assert_eq!(bus.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_alert_goes_to_bus_and_mirrors_datagram() {
        let bus = RecordingTransport::new("bus", true);
        let datagram = RecordingTransport::new("datagram", true);
        let router = TransportRouter::new(bus.clone(), Some(datagram.clone() as Arc<dyn MessageTransport>));

        let delivery = router.dispatch(&alert()).await;

        assert_eq!(delivery, Delivery { bus: true, datagram: true });
    }

    #[tokio::test]
    async fn test_offline_bus_drops_without_queueing() {
        let bus = RecordingTransport::new("bus", false);
        let router = TransportRouter::new(bus.clone(), None);

        assert!(!router.dispatch(&alert()).await.any());
        assert!(bus.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_datagram_transport_sends_fixed_record() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let transport = DatagramTransport::bind(target, false).await.unwrap();

        transport.send(&alert()).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        let record = DatagramRecord::decode(&buf[..len]).unwrap();
        assert_eq!(record, DatagramRecord::alert(2, 48.0, 4096));
    }
}
