// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain types for the swarm kernel: robot identity and kinematics, the
//! neighbor table, stigmergy spaces with their merge rule, packet framing,
//! and node configuration.

pub mod config;
pub mod neighbor;
pub mod packet;
pub mod robot;
pub mod stigmergy;

pub use config::NodeConfig;
pub use neighbor::{NeighborRecord, NeighborTable};
pub use packet::{OpRecord, Packet, PacketKind, PROTOCOL_VERSION};
pub use robot::{RobotBase, RobotId, Vec2};
pub use stigmergy::{SpaceId, StigmergyEntry, StigmergyError, StigmergySpace};
