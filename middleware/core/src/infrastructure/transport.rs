// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Packet transports.
//!
//! A transport delivers packets best-effort to every peer in range: no
//! ordering, no acknowledgment, duplication possible. The protocol above is
//! built to tolerate exactly that, so transports stay deliberately dumb.
//!
//! [`LocalBus`] is the in-memory transport used by tests and single-process
//! swarms; it models loss through bounded-channel lag. The UDP transport for
//! real deployments lives in [`crate::infrastructure::udp`].

use crate::application::kernel::Kernel;
use crate::domain::packet::Packet;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors from packet transmission.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport channel closed")]
    Closed,

    #[error("transport i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Best-effort broadcast to all peers in range.
///
/// Fire-and-forget: a successful return means the packet was handed to the
/// medium, not that any peer received it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn broadcast(&self, packet: Packet) -> Result<(), TransportError>;
}

/// In-memory broadcast medium shared by a set of co-located nodes.
///
/// Every subscriber sees every packet, including the sender's own (receivers
/// filter those out). A subscriber that falls behind the channel capacity
/// loses the oldest packets, which doubles as the loss model in tests.
#[derive(Clone)]
pub struct LocalBus {
    sender: Arc<broadcast::Sender<Packet>>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe a node to the medium.
    pub fn subscribe(&self) -> PacketReceiver {
        PacketReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of nodes currently listening.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Transport for LocalBus {
    async fn broadcast(&self, packet: Packet) -> Result<(), TransportError> {
        // A send with no listeners is not a failure; a lone robot keeps
        // operating on its local replica.
        let listeners = self.sender.send(packet).unwrap_or(0);
        if listeners == 0 {
            debug!("broadcast with no peers in range");
        }
        Ok(())
    }
}

/// Receiving side of a [`LocalBus`] subscription.
pub struct PacketReceiver {
    receiver: broadcast::Receiver<Packet>,
}

impl PacketReceiver {
    /// Receive the next packet, transparently skipping over lag gaps.
    ///
    /// Lost packets are logged and skipped, never surfaced as errors: packet
    /// loss is part of the transport contract.
    pub async fn recv(&mut self) -> Result<Packet, TransportError> {
        loop {
            match self.receiver.recv().await {
                Ok(packet) => return Ok(packet),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lost = n, "receiver lagged; packets dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(TransportError::Closed),
            }
        }
    }
}

/// Pump inbound packets from a subscription into a kernel until the bus
/// closes.
///
/// The kernel's own transmissions come back over the bus and are ignored
/// inside `handle_packet`. Per-packet dispatch failures are reported and the
/// pump keeps running; a single bad packet must never halt the node.
pub fn spawn_receiver(kernel: Arc<Kernel>, mut receiver: PacketReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(packet) = receiver.recv().await {
            if let Err(error) = kernel.handle_packet(&packet).await {
                warn!(source = %packet.source, %error, "dropped inbound packet");
            }
        }
        debug!("packet bus closed; receiver task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::packet::PacketKind;
    use crate::domain::robot::RobotId;
    use bytes::Bytes;

    fn packet(source: u32, payload: &'static [u8]) -> Packet {
        Packet::new(RobotId(source), PacketKind::Put, Bytes::from_static(payload))
    }

    #[tokio::test]
    async fn test_all_subscribers_see_a_broadcast() {
        let bus = LocalBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        bus.broadcast(packet(1, b"hello")).await.unwrap();

        assert_eq!(first.recv().await.unwrap().source, RobotId(1));
        assert_eq!(second.recv().await.unwrap().source, RobotId(1));
    }

    #[tokio::test]
    async fn test_broadcast_without_listeners_succeeds() {
        let bus = LocalBus::new(16);
        bus.broadcast(packet(1, b"unheard")).await.unwrap();
    }

    #[tokio::test]
    async fn test_two_kernels_on_one_bus_converge() {
        use crate::domain::config::NodeConfig;
        use crate::domain::stigmergy::SpaceId;

        let bus = LocalBus::new(64);
        let writer = Arc::new(Kernel::new(
            NodeConfig::for_robot(RobotId(1)),
            Arc::new(bus.clone()),
        ));
        let reader = Arc::new(Kernel::new(
            NodeConfig::for_robot(RobotId(2)),
            Arc::new(bus.clone()),
        ));
        let pump = spawn_receiver(Arc::clone(&reader), bus.subscribe());

        writer
            .put(SpaceId(1), "waypoint", Bytes::from_static(b"7,3"))
            .await
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while reader.size(SpaceId(1)) == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("replica should adopt the broadcast put");

        let value = reader.get(SpaceId(1), "waypoint").await.unwrap();
        assert_eq!(value.as_ref(), b"7,3");
        pump.abort();
    }

    #[tokio::test]
    async fn test_lagged_receiver_skips_to_fresh_packets() {
        let bus = LocalBus::new(2);
        let mut receiver = bus.subscribe();

        for i in 0..5u32 {
            bus.broadcast(packet(i, b"flood")).await.unwrap();
        }

        // The two most recent packets survive; the gap is skipped silently.
        assert_eq!(receiver.recv().await.unwrap().source, RobotId(3));
        assert_eq!(receiver.recv().await.unwrap().source, RobotId(4));
    }
}
