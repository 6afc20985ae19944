// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Node configuration.
//!
//! One `NodeConfig` is built at startup (CLI flags or a config file) and
//! handed to the kernel constructor. There is no global configuration state.

use crate::domain::robot::RobotId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one swarm node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique robot identifier, assigned externally.
    pub robot_id: RobotId,

    /// Sensing/communication range for neighbor membership, in world units.
    /// The boundary is inclusive.
    #[serde(default = "default_neighbor_distance")]
    pub neighbor_distance: f64,

    /// How recently a peer must have been heard to count as a neighbor.
    #[serde(default = "default_liveness_window", with = "humantime_serde")]
    pub liveness_window: Duration,
}

impl NodeConfig {
    /// Configuration with defaults for everything but the robot id.
    pub fn for_robot(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            neighbor_distance: default_neighbor_distance(),
            liveness_window: default_liveness_window(),
        }
    }
}

fn default_neighbor_distance() -> f64 {
    12.0
}

fn default_liveness_window() -> Duration {
    Duration::from_secs(2)
}
