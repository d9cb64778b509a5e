//! Packet resilience core for real-time audio streams
//!
//! This crate sits between the network receive path and depacketization:
//! - Packet source/sink contracts and a FIFO packet queue
//! - Jitter buffering with a fixed target delay
//! - FEC block repair over pluggable block codes (Reed-Solomon, XOR parity)
//! - Payload type registry and participant identity
//!
//! Everything here is synchronous and pull-based. A packet source that has
//! nothing to offer returns `Ok(None)`; retry policy belongs to the caller.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


pub mod error;
pub mod units;
pub mod packet;
pub mod sample_spec;
pub mod reader;
pub mod ring_queue;
pub mod packet_queue;
pub mod jitter_buffer;
pub mod fec;
pub mod format_map;
pub mod identity;

// Re-export main types
pub use error::{ResilienceError, ResilienceResult};
pub use units::{stream_timestamp_diff, Seqnum, StreamSource, StreamTimestamp, StreamTimestampDiff};
pub use packet::{Packet, FLAG_AUDIO, FLAG_RESTORED};
pub use sample_spec::{ChannelLayout, SampleSpec};
pub use reader::{PacketReader, PacketWriter};
pub use ring_queue::RingQueue;
pub use packet_queue::PacketQueue;
pub use jitter_buffer::{DelayedReader, JitterBufferConfig};
pub use fec::{
    decode_block, encode_block, new_block_decoder, new_block_encoder,
    BlockDecoder, BlockEncoder, FecCodecConfig, FecScheme,
    ReedSolomonDecoder, ReedSolomonEncoder, XorParityDecoder, XorParityEncoder,
};
pub use format_map::{Format, FormatMap, PcmEncoding, PcmEndian, PcmFormat};
pub use identity::Identity;
