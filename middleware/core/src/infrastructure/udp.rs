// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! UDP broadcast transport for real deployments.
//!
//! One socket per node; outbound packets are bincode frames sent to a
//! broadcast (or multicast-style relay) address, inbound datagrams are
//! decoded and pumped into the kernel. UDP gives exactly the guarantees the
//! protocol expects: best-effort, unordered, possibly duplicated.

use crate::application::kernel::Kernel;
use crate::domain::packet::Packet;
use crate::infrastructure::codec;
use crate::infrastructure::transport::{Transport, TransportError};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Datagrams larger than this are silently truncated by the medium, so the
/// sender refuses them up front.
const MAX_DATAGRAM: usize = 60 * 1024;

/// Broadcast transport over one UDP socket.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    peer_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind `local_addr` and direct broadcasts at `peer_addr` (typically a
    /// subnet broadcast address like `192.168.1.255:7400`).
    pub async fn bind(local_addr: SocketAddr, peer_addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local_addr).await?;
        socket.set_broadcast(true)?;
        debug!(%local_addr, %peer_addr, "udp transport bound");
        Ok(Self {
            socket: Arc::new(socket),
            peer_addr,
        })
    }

    /// Spawn the inbound pump: decode each datagram and hand it to the
    /// kernel. Malformed datagrams and dispatch drops are reported and
    /// skipped; the pump only exits on socket failure.
    pub fn spawn_receiver(&self, kernel: Arc<Kernel>) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                let (len, from) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(error) => {
                        warn!(%error, "udp receive failed; receiver exiting");
                        return;
                    }
                };
                let packet: Packet = match codec::decode(&buf[..len]) {
                    Ok(packet) => packet,
                    Err(error) => {
                        warn!(%from, %error, "undecodable datagram dropped");
                        continue;
                    }
                };
                if let Err(error) = kernel.handle_packet(&packet).await {
                    warn!(source = %packet.source, %error, "dropped inbound packet");
                }
            }
        })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn broadcast(&self, packet: Packet) -> Result<(), TransportError> {
        let frame = codec::encode(&packet).map_err(|error| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                error.to_string(),
            ))
        })?;
        if frame.len() > MAX_DATAGRAM {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "packet exceeds datagram limit",
            )));
        }
        self.socket.send_to(&frame, self.peer_addr).await?;
        Ok(())
    }
}
