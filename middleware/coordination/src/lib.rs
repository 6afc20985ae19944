// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hivemesh-coordination` — Leaderless Coordination Primitives
//!
//! Thin conventions layered over the `hivemesh-core` stigmergy protocol.
//! Nothing in this crate speaks to the network directly; everything is built
//! from `put`/`get`/`size` on a shared kernel.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`barrier`] | Fixed-size group rendezvous with no elected leader |
//! | [`handle`] | [`handle::Stigmergy`], a typed view over one stigmergy space |

pub mod barrier;
pub mod handle;

pub use barrier::{barrier_wait, BarrierConfig, BarrierError};
pub use handle::{HandleError, Stigmergy};
