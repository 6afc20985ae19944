// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Barrier/rendezvous for a known, fixed-size group.
//!
//! Pure convention over virtual stigmergy: each participant writes its own
//! robot id as a key into a well-known space, then polls the space size
//! until every member's write is visible. No leader, no extra protocol.
//!
//! ## Limitation (by construction)
//!
//! Without a deadline the wait is unbounded: a crashed or permanently
//! unreachable member whose write never arrives blocks every other
//! participant forever. Run the barrier on its own task and set
//! [`BarrierConfig::deadline`] when the mission profile cannot tolerate
//! that.

use bytes::Bytes;
use hivemesh_core::{Kernel, SpaceId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Tuning for the barrier poll loop.
#[derive(Debug, Clone)]
pub struct BarrierConfig {
    /// Delay between membership polls.
    pub poll_interval: Duration,
    /// Optional upper bound on the whole wait. `None` means wait forever.
    pub deadline: Option<Duration>,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            deadline: None,
        }
    }
}

/// Errors from a barrier wait.
#[derive(Debug, Error)]
pub enum BarrierError {
    #[error("barrier on {space} saw {seen}/{expected} members within {deadline:?}")]
    DeadlineExceeded {
        space: SpaceId,
        seen: usize,
        expected: usize,
        deadline: Duration,
    },
}

/// Announce this node's arrival in `space` and wait until `expected` members
/// have arrived.
///
/// Arrival order of the underlying packets does not matter; the count only
/// grows. Returns as soon as the local replica shows `expected` distinct
/// member keys.
pub async fn barrier_wait(
    kernel: &Arc<Kernel>,
    space: SpaceId,
    expected: usize,
    config: BarrierConfig,
) -> Result<(), BarrierError> {
    let member_key = kernel.robot_id().as_u32().to_string();
    // The value is irrelevant; membership is carried by the key itself.
    if let Err(error) = kernel.put(space, member_key, Bytes::from_static(&[1])).await {
        debug!(%space, %error, "arrival announcement failed to encode");
    }

    let poll = async {
        loop {
            let seen = kernel.size(space);
            if seen >= expected {
                info!(%space, expected, "barrier released");
                return;
            }
            debug!(%space, seen, expected, "barrier waiting");
            tokio::time::sleep(config.poll_interval).await;
        }
    };

    match config.deadline {
        None => {
            poll.await;
            Ok(())
        }
        Some(deadline) => tokio::time::timeout(deadline, poll).await.map_err(|_| {
            BarrierError::DeadlineExceeded {
                space,
                seen: kernel.size(space),
                expected,
                deadline,
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivemesh_core::infrastructure::codec;
    use hivemesh_core::infrastructure::transport::{spawn_receiver, LocalBus};
    use hivemesh_core::{NodeConfig, OpRecord, Packet, PacketKind, RobotId};

    fn node(bus: &LocalBus, id: u32) -> Arc<Kernel> {
        Arc::new(Kernel::new(
            NodeConfig::for_robot(RobotId(id)),
            Arc::new(bus.clone()),
        ))
    }

    fn arrival_packet(robot: u32, space: u32) -> Packet {
        let record = OpRecord {
            space: SpaceId(space),
            key: robot.to_string(),
            value: Bytes::from_static(&[1]),
            timestamp: 1,
            writer: RobotId(robot),
        };
        Packet::new(
            RobotId(robot),
            PacketKind::Put,
            codec::encode(&record).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_barrier_releases_once_all_arrivals_are_visible() {
        let bus = LocalBus::new(64);
        let kernel = node(&bus, 1);

        let waiter = {
            let kernel = Arc::clone(&kernel);
            tokio::spawn(async move {
                barrier_wait(&kernel, SpaceId(1), 3, BarrierConfig::default()).await
            })
        };

        // Only our own arrival so far; the barrier must still be waiting.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!waiter.is_finished());

        // Inject the two remaining arrivals in reverse id order; arrival
        // order must not matter.
        kernel.handle_packet(&arrival_packet(3, 1)).await.unwrap();
        assert!(!waiter.is_finished());
        kernel.handle_packet(&arrival_packet(2, 1)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("barrier should release")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_three_nodes_rendezvous_over_a_shared_bus() {
        let bus = LocalBus::new(64);
        let nodes: Vec<Arc<Kernel>> = (1..=3).map(|id| node(&bus, id)).collect();
        let pumps: Vec<_> = nodes
            .iter()
            .map(|n| spawn_receiver(Arc::clone(n), bus.subscribe()))
            .collect();

        let waiters: Vec<_> = nodes
            .iter()
            .map(|n| {
                let n = Arc::clone(n);
                tokio::spawn(async move {
                    barrier_wait(
                        &n,
                        SpaceId(1),
                        3,
                        BarrierConfig {
                            poll_interval: Duration::from_millis(10),
                            deadline: Some(Duration::from_secs(5)),
                        },
                    )
                    .await
                })
            })
            .collect();

        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }
        for pump in pumps {
            pump.abort();
        }
    }

    #[tokio::test]
    async fn test_missing_member_trips_the_deadline() {
        let bus = LocalBus::new(64);
        let kernel = node(&bus, 1);

        let result = barrier_wait(
            &kernel,
            SpaceId(1),
            2,
            BarrierConfig {
                poll_interval: Duration::from_millis(10),
                deadline: Some(Duration::from_millis(100)),
            },
        )
        .await;

        match result {
            Err(BarrierError::DeadlineExceeded { seen, expected, .. }) => {
                assert_eq!(seen, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("expected deadline error, got {other:?}"),
        }
    }
}
