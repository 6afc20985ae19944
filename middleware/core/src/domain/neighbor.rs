// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Neighbor tracking: who is near me right now, and where are they going.
//!
//! The table accumulates kinematic broadcasts asynchronously as they arrive
//! and answers snapshot queries synchronously at the start of each control
//! cycle. Membership is pure geometry plus recency; a peer can leave and
//! re-enter the snapshot on consecutive cycles.

use crate::domain::robot::{RobotId, Vec2};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One peer's latest reported kinematic state, as seen in a snapshot.
///
/// Value copy of the peer's broadcast, never a reference into remote state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub robot_id: RobotId,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    position: Vec2,
    velocity: Vec2,
    heard_at: Instant,
}

/// Table of recently heard peers.
///
/// Writers are inbound-broadcast handlers; readers are control-cycle
/// snapshots. All access goes through one internal lock, held only for the
/// duration of the map operation.
#[derive(Debug, Default)]
pub struct NeighborTable {
    observations: RwLock<HashMap<RobotId, Observation>>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest kinematic broadcast from `robot_id`, replacing any
    /// previous observation.
    pub fn observe(&self, robot_id: RobotId, position: Vec2, velocity: Vec2) {
        self.observations.write().insert(
            robot_id,
            Observation {
                position,
                velocity,
                heard_at: Instant::now(),
            },
        );
    }

    /// Build the current neighbor snapshot.
    ///
    /// A peer is included iff it was heard within `liveness_window` and its
    /// reported position is within `max_distance` of `origin`. The distance
    /// boundary is inclusive so a peer sitting exactly on the threshold does
    /// not flap in and out of the table. Peers silent beyond the window are
    /// pruned from the underlying map so it cannot grow without bound.
    pub fn snapshot(
        &self,
        origin: Vec2,
        max_distance: f64,
        liveness_window: Duration,
    ) -> Vec<NeighborRecord> {
        let now = Instant::now();
        let mut observations = self.observations.write();
        observations.retain(|_, obs| now.duration_since(obs.heard_at) <= liveness_window);
        observations
            .iter()
            .filter(|(_, obs)| origin.distance(obs.position) <= max_distance)
            .map(|(&robot_id, obs)| NeighborRecord {
                robot_id,
                position: obs.position,
                velocity: obs.velocity,
            })
            .collect()
    }

    /// Number of peers currently observed, regardless of range.
    pub fn observed_count(&self) -> usize {
        self.observations.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_peer_exactly_at_threshold_is_included() {
        let table = NeighborTable::new();
        table.observe(RobotId(1), Vec2::new(12.0, 0.0), Vec2::default());
        table.observe(RobotId(2), Vec2::new(13.0, 0.0), Vec2::default());

        let snapshot = table.snapshot(Vec2::default(), 12.0, WINDOW);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].robot_id, RobotId(1));
    }

    #[test]
    fn test_stale_peer_is_dropped_and_pruned() {
        let table = NeighborTable::new();
        table.observe(RobotId(1), Vec2::new(1.0, 1.0), Vec2::default());
        assert_eq!(table.observed_count(), 1);

        // Zero-length window: everything already heard is stale.
        std::thread::sleep(Duration::from_millis(2));
        let snapshot = table.snapshot(Vec2::default(), 100.0, Duration::ZERO);
        assert!(snapshot.is_empty());
        assert_eq!(table.observed_count(), 0);
    }

    #[test]
    fn test_re_observation_overwrites_previous_state() {
        let table = NeighborTable::new();
        table.observe(RobotId(7), Vec2::new(50.0, 0.0), Vec2::default());
        table.observe(RobotId(7), Vec2::new(2.0, 0.0), Vec2::new(0.5, 0.0));

        let snapshot = table.snapshot(Vec2::default(), 10.0, WINDOW);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].position, Vec2::new(2.0, 0.0));
        assert_eq!(snapshot[0].velocity, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_membership_is_not_sticky() {
        let table = NeighborTable::new();
        table.observe(RobotId(3), Vec2::new(5.0, 0.0), Vec2::default());
        assert_eq!(table.snapshot(Vec2::default(), 10.0, WINDOW).len(), 1);

        // Peer reports itself out of range; next snapshot excludes it.
        table.observe(RobotId(3), Vec2::new(20.0, 0.0), Vec2::default());
        assert!(table.snapshot(Vec2::default(), 10.0, WINDOW).is_empty());

        // And back in.
        table.observe(RobotId(3), Vec2::new(8.0, 0.0), Vec2::default());
        assert_eq!(table.snapshot(Vec2::default(), 10.0, WINDOW).len(), 1);
    }
}
