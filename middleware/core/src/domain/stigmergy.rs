// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Virtual stigmergy: replicated shared key-value spaces.
//!
//! Each node holds an independent replica of every space it has referenced;
//! replicas are reconciled purely by exchanging complete-state PUT records
//! and applying the last-writer-wins merge rule below. The merge is
//! commutative and idempotent, so convergence does not depend on delivery
//! order and tolerates duplicated packets.

use crate::domain::robot::RobotId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Identifier of one logical stigmergy space.
///
/// Spaces are independent replicated dictionaries; operations on one space
/// never touch another. Spaces come into existence lazily on first local or
/// remote reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceId(pub u32);

impl std::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "space-{}", self.0)
    }
}

/// Errors surfaced by stigmergy reads.
#[derive(Debug, Error)]
pub enum StigmergyError {
    /// The key has never been observed locally, neither by a local `put` nor
    /// by a remote record. Callers must handle this explicitly; there is no
    /// default value.
    #[error("key {key:?} not found in {space}")]
    KeyNotFound { space: SpaceId, key: String },
}

/// Last known state of one key within one space.
///
/// Exactly one entry is retained per key. Entries are replaced by the merge
/// rule in [`StigmergySpace::merge`] and never deleted (no tombstones).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StigmergyEntry {
    /// Opaque serialized value; the codec that produced it is a caller
    /// concern, the protocol only moves bytes.
    pub value: Bytes,
    /// Wall-clock stamp of the write, in UNIX seconds.
    pub timestamp: u64,
    /// The robot that performed the write. Secondary merge key.
    pub writer: RobotId,
}

impl StigmergyEntry {
    /// Whether this entry beats `other` under last-writer-wins.
    ///
    /// Wins iff strictly newer, or equally new with a higher writer id. The
    /// tie-break makes the merge deterministic across replicas regardless of
    /// arrival order.
    pub fn supersedes(&self, other: &StigmergyEntry) -> bool {
        self.timestamp > other.timestamp
            || (self.timestamp == other.timestamp && self.writer > other.writer)
    }
}

/// One node's replica of a single stigmergy space.
#[derive(Debug, Default)]
pub struct StigmergySpace {
    entries: HashMap<String, StigmergyEntry>,
}

impl StigmergySpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an incoming entry (local write or remote record) for `key`.
    ///
    /// Returns `true` if the entry was adopted. Re-applying the same entry is
    /// a no-op: an entry never supersedes itself.
    pub fn merge(&mut self, key: &str, incoming: StigmergyEntry) -> bool {
        match self.entries.get(key) {
            Some(current) if !incoming.supersedes(current) => false,
            _ => {
                self.entries.insert(key.to_owned(), incoming);
                true
            }
        }
    }

    /// Apply a write issued by this node.
    ///
    /// Local writes take priority over an equal-stamped existing entry so
    /// that same-key operations from one execution context land in call
    /// order; only a strictly superseding existing entry is kept.
    pub fn apply_local(&mut self, key: &str, incoming: StigmergyEntry) -> bool {
        match self.entries.get(key) {
            Some(current) if current.supersedes(&incoming) => false,
            _ => {
                self.entries.insert(key.to_owned(), incoming);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&StigmergyEntry> {
        self.entries.get(key)
    }

    /// Number of distinct keys held locally.
    ///
    /// The barrier primitive reads this as a membership count: each
    /// participant writes exactly one key (its own id), so distinct keys and
    /// distinct contributors coincide by convention.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
