// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

/// Unique identifier for a robot in the swarm.
///
/// Assigned externally at node startup (launch parameter, not negotiated) and
/// carried as a `u32` on the wire. Also serves as the deterministic tie-break
/// key for concurrent stigmergy writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotId(pub u32);

impl RobotId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "robot-{}", self.0)
    }
}

/// A 2-D vector used for both positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The local robot's latest pose and velocity.
///
/// Single mutable record, overwritten in place by each kinematic sensor
/// update and read by the control law every cycle. Peers never see this
/// struct directly; they learn about it through kinematic broadcasts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RobotBase {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl RobotBase {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn test_robot_id_ordering_matches_raw_value() {
        assert!(RobotId(9) > RobotId(5));
    }
}
