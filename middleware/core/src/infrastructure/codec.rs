// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire codec: a symmetric bincode encode/decode pair.
//!
//! Used for both the packet frame itself (UDP transport) and for the typed
//! application values stored in stigmergy spaces. The codec is the only
//! serialization seam in the crate; swapping the format means changing this
//! module alone.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from the wire codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(#[source] bincode::Error),

    #[error("decode failed: {0}")]
    Decode(#[source] bincode::Error),
}

/// Serialize a value to wire bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, CodecError> {
    bincode::serialize(value)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Deserialize a value from wire bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::packet::{OpRecord, Packet, PacketKind};
    use crate::domain::robot::RobotId;
    use crate::domain::stigmergy::SpaceId;

    #[test]
    fn test_packet_frame_round_trip() {
        let record = OpRecord {
            space: SpaceId(1),
            key: "k".to_owned(),
            value: Bytes::from_static(b"\x01"),
            timestamp: 1_700_000_000,
            writer: RobotId(3),
        };
        let packet = Packet::new(RobotId(3), PacketKind::Put, encode(&record).unwrap());

        let bytes = encode(&packet).unwrap();
        let decoded: Packet = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decode::<OpRecord>(&decoded.payload).unwrap(), record);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = decode::<Packet>(b"not a packet").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
