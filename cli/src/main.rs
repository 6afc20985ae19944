// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hivemesh-node` — Swarm Node Runner
//!
//! Wires one middleware node together: kernel, UDP broadcast transport, and
//! an optional startup barrier, then reports the neighbor view periodically.
//!
//! Motion control and kinematic sensing are platform integrations that live
//! outside this binary and consume the same kernel handle this runner
//! constructs: the sensor driver feeds `set_robot_base` and
//! `observe_neighbor`, the control law reads `neighbors()`. Until such an
//! integration is wired in, the reported neighbor view stays empty — only
//! the stigmergy traffic (puts, queries, the startup barrier) is live here.

use anyhow::{Context, Result};
use clap::Parser;
use hivemesh_core::{Kernel, NodeConfig, RobotId, SpaceId, Transport, UdpTransport};
use hivemesh_coordination::{barrier_wait, BarrierConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// HIVEMESH swarm node.
#[derive(Parser)]
#[command(name = "hivemesh-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Unique robot identifier for this node
    #[arg(long, env = "HIVEMESH_ROBOT_ID")]
    robot_id: u32,

    /// Local UDP address to bind
    #[arg(long, env = "HIVEMESH_BIND", default_value = "0.0.0.0:7400")]
    bind: SocketAddr,

    /// Broadcast address reaching the rest of the swarm
    #[arg(long, env = "HIVEMESH_PEERS", default_value = "255.255.255.255:7400")]
    peers: SocketAddr,

    /// Neighbor sensing range in world units (boundary inclusive)
    #[arg(long, default_value_t = 12.0)]
    neighbor_distance: f64,

    /// Rendezvous with this many swarm members before reporting starts.
    /// Waits forever unless --barrier-deadline-secs is set.
    #[arg(long)]
    swarm_size: Option<usize>,

    /// Stigmergy space used for the startup barrier
    #[arg(long, default_value_t = 1)]
    barrier_space: u32,

    /// Abort the startup barrier after this many seconds
    #[arg(long)]
    barrier_deadline_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HIVEMESH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut config = NodeConfig::for_robot(RobotId(cli.robot_id));
    config.neighbor_distance = cli.neighbor_distance;

    let transport = Arc::new(
        UdpTransport::bind(cli.bind, cli.peers)
            .await
            .with_context(|| format!("binding udp transport on {}", cli.bind))?,
    );
    let kernel = Arc::new(Kernel::new(
        config,
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));
    transport.spawn_receiver(Arc::clone(&kernel));
    info!(robot = %kernel.robot_id(), bind = %cli.bind, peers = %cli.peers, "node up");

    if let Some(expected) = cli.swarm_size {
        let barrier = BarrierConfig {
            poll_interval: Duration::from_millis(100),
            deadline: cli.barrier_deadline_secs.map(Duration::from_secs),
        };
        info!(expected, space = cli.barrier_space, "waiting at startup barrier");
        barrier_wait(&kernel, SpaceId(cli.barrier_space), expected, barrier)
            .await
            .context("startup barrier failed")?;
        info!("startup barrier released");
    }

    // Report the neighbor view until interrupted. A control law would run
    // its cycle here instead, reading the same snapshots. The count stays
    // zero until a sensor integration feeds `observe_neighbor`.
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tick.tick().await;
        let neighbors = kernel.neighbors();
        info!(count = neighbors.len(), "neighbor snapshot");
        for neighbor in &neighbors {
            info!(
                robot = %neighbor.robot_id,
                x = neighbor.position.x,
                y = neighbor.position.y,
                vx = neighbor.velocity.x,
                vy = neighbor.velocity.y,
                "neighbor"
            );
        }
    }
}
