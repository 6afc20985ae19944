// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Typed stigmergy handles.
//!
//! A [`Stigmergy<T>`] is a thin reference to one space on one kernel, with
//! the value codec applied at the edge. Handles are cheap to clone and own
//! nothing; the kernel remains the sole owner of replica state.

use bytes::Bytes;
use hivemesh_core::infrastructure::codec::{self, CodecError};
use hivemesh_core::{Kernel, SpaceId, StigmergyError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Errors from typed stigmergy access.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error(transparent)]
    Stigmergy(#[from] StigmergyError),

    /// The stored bytes do not decode as `T`. Usually two applications are
    /// using one space id with different value types.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Typed view over one stigmergy space.
pub struct Stigmergy<T> {
    kernel: Arc<Kernel>,
    space: SpaceId,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Stigmergy<T> {
    fn clone(&self) -> Self {
        Self {
            kernel: Arc::clone(&self.kernel),
            space: self.space,
            _value: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Stigmergy<T> {
    pub fn new(kernel: Arc<Kernel>, space: SpaceId) -> Self {
        Self {
            kernel,
            space,
            _value: PhantomData,
        }
    }

    pub fn space(&self) -> SpaceId {
        self.space
    }

    /// Encode `value` and write it under `key`. Fire-and-forget like the
    /// underlying kernel `put`.
    pub async fn put(&self, key: impl Into<String>, value: &T) -> Result<(), HandleError> {
        let bytes = codec::encode(value)?;
        self.kernel.put(self.space, key, bytes).await?;
        Ok(())
    }

    /// Read and decode the locally held value for `key`.
    pub async fn get(&self, key: &str) -> Result<T, HandleError> {
        let bytes: Bytes = self.kernel.get(self.space, key).await?;
        Ok(codec::decode(&bytes)?)
    }

    /// Distinct keys currently held in the space.
    pub fn len(&self) -> usize {
        self.kernel.size(self.space)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivemesh_core::infrastructure::transport::LocalBus;
    use hivemesh_core::{NodeConfig, RobotId};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Waypoint {
        x: f64,
        y: f64,
        label: String,
    }

    fn kernel() -> Arc<Kernel> {
        Arc::new(Kernel::new(
            NodeConfig::for_robot(RobotId(1)),
            Arc::new(LocalBus::new(16)),
        ))
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_the_kernel() {
        let handle: Stigmergy<Waypoint> = Stigmergy::new(kernel(), SpaceId(2));
        let waypoint = Waypoint {
            x: 4.0,
            y: -1.5,
            label: "charging-dock".to_owned(),
        };

        handle.put("dock", &waypoint).await.unwrap();
        assert_eq!(handle.get("dock").await.unwrap(), waypoint);
        assert_eq!(handle.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_key_not_found() {
        let handle: Stigmergy<Waypoint> = Stigmergy::new(kernel(), SpaceId(2));
        let err = handle.get("nowhere").await.unwrap_err();
        assert!(matches!(
            err,
            HandleError::Stigmergy(StigmergyError::KeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_mistyped_value_surfaces_codec_error() {
        let k = kernel();
        let strings: Stigmergy<String> = Stigmergy::new(Arc::clone(&k), SpaceId(2));
        strings.put("k", &"text".to_owned()).await.unwrap();

        // Same space read through an incompatible type.
        let points: Stigmergy<Waypoint> = Stigmergy::new(k, SpaceId(2));
        let err = points.get("k").await.unwrap_err();
        assert!(matches!(err, HandleError::Codec(_)));
    }
}
