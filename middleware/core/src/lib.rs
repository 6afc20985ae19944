// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hivemesh-core` — Swarm Coordination Kernel
//!
//! Per-robot middleware kernel for the HIVEMESH swarm stack. Every robot runs
//! an identical node; nodes cooperate over a lossy, broadcast-style link with
//! no central coordinator.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | Robot identity, neighbor table, stigmergy spaces, packet types |
//! | [`application`] | Application | The [`Kernel`] dispatcher and its outward API |
//! | [`infrastructure`] | Infrastructure | Wire codec and transports (in-memory bus, UDP) |
//!
//! ## Key Concepts
//!
//! - **Virtual stigmergy**: a replicated key-value space reconciled by
//!   last-writer-wins merges. Every `put` re-broadcasts complete entry state,
//!   so a dropped packet only delays convergence, never corrupts it.
//! - **Neighbor table**: a per-cycle snapshot of peers heard recently and
//!   positioned within the configured sensing range. Membership is
//!   re-evaluated on every snapshot; there is no sticky membership.
//! - **Fire-and-forget broadcast**: no acknowledgments anywhere in the
//!   protocol. Availability is preferred over consistency by design; callers
//!   must not assume a `put` has reached any peer when it returns.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::kernel::{DispatchError, Kernel};
pub use infrastructure::{LocalBus, Transport, TransportError, UdpTransport};
