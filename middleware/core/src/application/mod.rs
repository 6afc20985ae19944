// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: the per-node [`kernel::Kernel`].

pub mod kernel;

pub use kernel::{DispatchError, Kernel};
