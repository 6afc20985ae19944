// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Packet framing for the swarm protocol.
//!
//! Packets are transient: constructed, serialized, broadcast, and discarded.
//! The transport gives no ordering or delivery guarantee, so every packet
//! must be self-contained — PUT and QUERY_REPLY carry complete entry state,
//! never deltas.

use crate::domain::robot::RobotId;
use crate::domain::stigmergy::SpaceId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Protocol version carried by every packet. Mismatched packets are dropped.
pub const PROTOCOL_VERSION: u32 = 1;

/// Discriminant for the three protocol operations.
///
/// The listed values are the protocol's logical numbering; on the wire the
/// codec encodes serde variant indices, which all nodes share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum PacketKind {
    /// Complete-state write record; receivers merge it last-writer-wins.
    Put = 1,
    /// Pull-refresh signal carrying the issuer's current view of a key.
    /// Not required for correctness of any local read.
    Query = 2,
    /// Response to a QUERY when the responder holds a newer entry. Applied
    /// exactly like a PUT.
    QueryReply = 3,
}

/// One protocol datagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub source: RobotId,
    pub version: u32,
    pub kind: PacketKind,
    pub payload: Bytes,
    /// Truncated SHA-256 over the payload. Verified on receive; packets that
    /// fail verification are dropped and reported.
    pub checksum: u32,
}

impl Packet {
    /// Frame a payload with the current protocol version and its checksum.
    pub fn new(source: RobotId, kind: PacketKind, payload: Bytes) -> Self {
        let checksum = payload_checksum(&payload);
        Self {
            source,
            version: PROTOCOL_VERSION,
            kind,
            payload,
            checksum,
        }
    }

    pub fn checksum_ok(&self) -> bool {
        payload_checksum(&self.payload) == self.checksum
    }
}

/// Payload of PUT, QUERY, and QUERY_REPLY packets: one complete entry tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpRecord {
    pub space: SpaceId,
    pub key: String,
    pub value: Bytes,
    /// UNIX seconds at the time of the write; `0` on a QUERY for a key the
    /// issuer has never observed.
    pub timestamp: u64,
    pub writer: RobotId,
}

/// First four little-endian bytes of SHA-256 over the payload.
fn payload_checksum(payload: &[u8]) -> u32 {
    let digest = Sha256::digest(payload);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}
