// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The per-node kernel: single entry point for outbound stigmergy operations
//! and demultiplexer for inbound packets.
//!
//! One `Kernel` is constructed at node startup and shared as `Arc<Kernel>`
//! between the control loop, the inbound receiver task, and any coordination
//! primitives. There is no global state; everything a node knows lives here.

use crate::domain::config::NodeConfig;
use crate::domain::neighbor::{NeighborRecord, NeighborTable};
use crate::domain::packet::{OpRecord, Packet, PacketKind, PROTOCOL_VERSION};
use crate::domain::robot::{RobotBase, RobotId, Vec2};
use crate::domain::stigmergy::{SpaceId, StigmergyEntry, StigmergyError, StigmergySpace};
use crate::infrastructure::codec::{self, CodecError};
use crate::infrastructure::transport::Transport;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Why an inbound packet was dropped. Every variant is local and non-fatal:
/// the packet is discarded, the node keeps running, and unrelated keys and
/// spaces are untouched.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported protocol version {got} (expected {PROTOCOL_VERSION})")]
    VersionMismatch { got: u32 },

    // Field deliberately not named `source`: thiserror reserves that name
    // for error-source chaining.
    #[error("checksum mismatch on packet from {from}")]
    ChecksumMismatch { from: RobotId },

    #[error(transparent)]
    Decode(#[from] CodecError),
}

/// Per-node kernel state: identity, kinematics, neighbor table, and the
/// replicas of every stigmergy space this node has referenced.
///
/// Locking is per concern: one lock per stigmergy space (mutations of
/// unrelated spaces never serialize against each other), one for the space
/// map itself, one each for the robot base and the neighbor distance. No
/// lock is ever held across an `.await`.
pub struct Kernel {
    robot_id: RobotId,
    liveness_window: Duration,
    neighbor_distance: RwLock<f64>,
    base: RwLock<RobotBase>,
    neighbors: NeighborTable,
    spaces: RwLock<HashMap<SpaceId, Arc<Mutex<StigmergySpace>>>>,
    transport: Arc<dyn Transport>,
}

impl Kernel {
    pub fn new(config: NodeConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            robot_id: config.robot_id,
            liveness_window: config.liveness_window,
            neighbor_distance: RwLock::new(config.neighbor_distance),
            base: RwLock::new(RobotBase::default()),
            neighbors: NeighborTable::new(),
            spaces: RwLock::new(HashMap::new()),
            transport,
        }
    }

    pub fn robot_id(&self) -> RobotId {
        self.robot_id
    }

    // ---- kinematics & neighbors -------------------------------------------

    /// Overwrite the local pose/velocity. Called by the kinematic sensor
    /// collaborator on every update.
    pub fn set_robot_base(&self, base: RobotBase) {
        *self.base.write() = base;
    }

    pub fn robot_base(&self) -> RobotBase {
        *self.base.read()
    }

    pub fn set_neighbor_distance(&self, distance: f64) {
        *self.neighbor_distance.write() = distance;
    }

    pub fn neighbor_distance(&self) -> f64 {
        *self.neighbor_distance.read()
    }

    /// Record a kinematic broadcast from a peer. Broadcasts that echo back
    /// with our own id are ignored.
    pub fn observe_neighbor(&self, robot_id: RobotId, position: Vec2, velocity: Vec2) {
        if robot_id == self.robot_id {
            return;
        }
        self.neighbors.observe(robot_id, position, velocity);
    }

    /// Current neighbor snapshot: peers heard within the liveness window and
    /// positioned within the configured distance (boundary inclusive) of the
    /// local robot's last known position.
    pub fn neighbors(&self) -> Vec<NeighborRecord> {
        let origin = self.robot_base().position;
        self.neighbors
            .snapshot(origin, self.neighbor_distance(), self.liveness_window)
    }

    // ---- virtual stigmergy -------------------------------------------------

    /// Write `value` under `key` in `space`, then broadcast the write.
    ///
    /// The write is stamped with wall-clock seconds and this robot's id,
    /// applied locally, and re-broadcast as a complete-state PUT record.
    /// Fire-and-forget: returns after local apply plus hand-off to the
    /// transport; a failed broadcast is reported and swallowed, since a later
    /// put of the key carries the same information forward.
    pub async fn put(
        &self,
        space: SpaceId,
        key: impl Into<String>,
        value: Bytes,
    ) -> Result<(), CodecError> {
        let key = key.into();
        let record = OpRecord {
            space,
            key: key.clone(),
            value: value.clone(),
            timestamp: now_seconds(),
            writer: self.robot_id,
        };

        self.space(space).lock().apply_local(
            &key,
            StigmergyEntry {
                value,
                timestamp: record.timestamp,
                writer: record.writer,
            },
        );

        self.broadcast_record(PacketKind::Put, &record).await
    }

    /// Read the locally held value for `key` in `space`.
    ///
    /// Never waits for the network: the local replica answers immediately.
    /// As a side effect a QUERY carrying this node's view of the key is
    /// broadcast so a peer holding a newer entry can push a QUERY_REPLY —
    /// a convergence accelerator, not a requirement for this read.
    pub async fn get(&self, space: SpaceId, key: &str) -> Result<Bytes, StigmergyError> {
        let local = self
            .space(space)
            .lock()
            .get(key)
            .cloned();

        let record = match &local {
            Some(entry) => OpRecord {
                space,
                key: key.to_owned(),
                value: entry.value.clone(),
                timestamp: entry.timestamp,
                writer: entry.writer,
            },
            // Never-seen key: query with a zero stamp so any holder replies.
            None => OpRecord {
                space,
                key: key.to_owned(),
                value: Bytes::new(),
                timestamp: 0,
                writer: self.robot_id,
            },
        };
        if let Err(error) = self.broadcast_record(PacketKind::Query, &record).await {
            warn!(%space, key, %error, "query broadcast failed");
        }

        local
            .map(|entry| entry.value)
            .ok_or_else(|| StigmergyError::KeyNotFound {
                space,
                key: key.to_owned(),
            })
    }

    /// Number of distinct keys held locally for `space`.
    pub fn size(&self, space: SpaceId) -> usize {
        self.space(space).lock().len()
    }

    // ---- inbound dispatch --------------------------------------------------

    /// Validate and route one inbound packet.
    ///
    /// Own transmissions echoed back by the medium are ignored. Version,
    /// checksum, and decode failures drop the packet with an error the
    /// caller is expected to log; they never halt dispatch.
    pub async fn handle_packet(&self, packet: &Packet) -> Result<(), DispatchError> {
        if packet.source == self.robot_id {
            trace!("ignoring own packet echoed by the medium");
            return Ok(());
        }
        if packet.version != PROTOCOL_VERSION {
            return Err(DispatchError::VersionMismatch {
                got: packet.version,
            });
        }
        if !packet.checksum_ok() {
            return Err(DispatchError::ChecksumMismatch {
                from: packet.source,
            });
        }

        let record: OpRecord = codec::decode(&packet.payload)?;
        match packet.kind {
            PacketKind::Put | PacketKind::QueryReply => {
                self.merge_remote(&record);
            }
            PacketKind::Query => self.answer_query(&record).await,
        }
        Ok(())
    }

    /// Merge a remote complete-state record into the addressed space.
    fn merge_remote(&self, record: &OpRecord) {
        let adopted = self.space(record.space).lock().merge(
            &record.key,
            StigmergyEntry {
                value: record.value.clone(),
                timestamp: record.timestamp,
                writer: record.writer,
            },
        );
        if adopted {
            debug!(space = %record.space, key = %record.key, writer = %record.writer,
                "adopted remote entry");
        }
    }

    /// Handle a QUERY: adopt the issuer's view if it is newer than ours, and
    /// push a QUERY_REPLY if ours is newer than theirs. Sending no reply is
    /// a missed optimization, never an error.
    async fn answer_query(&self, record: &OpRecord) {
        // A zero stamp marks a query for a key the issuer has never seen;
        // there is nothing to adopt from it.
        if record.timestamp > 0 {
            self.merge_remote(record);
        }

        let local = self.space(record.space).lock().get(&record.key).cloned();
        let Some(entry) = local else { return };

        let issuer_view = StigmergyEntry {
            value: record.value.clone(),
            timestamp: record.timestamp,
            writer: record.writer,
        };
        if record.timestamp == 0 || entry.supersedes(&issuer_view) {
            let reply = OpRecord {
                space: record.space,
                key: record.key.clone(),
                value: entry.value.clone(),
                timestamp: entry.timestamp,
                writer: entry.writer,
            };
            if let Err(error) = self.broadcast_record(PacketKind::QueryReply, &reply).await {
                warn!(space = %record.space, key = %record.key, %error,
                    "query reply broadcast failed");
            }
        }
    }

    // ---- internals ---------------------------------------------------------

    /// Look up a space replica, creating an empty one on first reference.
    fn space(&self, space: SpaceId) -> Arc<Mutex<StigmergySpace>> {
        if let Some(existing) = self.spaces.read().get(&space) {
            return Arc::clone(existing);
        }
        let mut spaces = self.spaces.write();
        Arc::clone(
            spaces
                .entry(space)
                .or_insert_with(|| Arc::new(Mutex::new(StigmergySpace::new()))),
        )
    }

    async fn broadcast_record(
        &self,
        kind: PacketKind,
        record: &OpRecord,
    ) -> Result<(), CodecError> {
        let payload = codec::encode(record)?;
        let packet = Packet::new(self.robot_id, kind, payload);
        if let Err(error) = self.transport.broadcast(packet).await {
            warn!(%error, "broadcast failed; relying on later writes to converge");
        }
        Ok(())
    }
}

/// Wall-clock seconds since the UNIX epoch; the stigmergy write stamp.
fn now_seconds() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
