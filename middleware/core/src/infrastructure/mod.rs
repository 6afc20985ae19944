// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters: the wire codec and the packet transports.

pub mod codec;
pub mod transport;
pub mod udp;

pub use codec::{decode, encode, CodecError};
pub use transport::{LocalBus, PacketReceiver, Transport, TransportError};
pub use udp::UdpTransport;
