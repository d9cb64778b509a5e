//! Audio packet as seen by the resilience core
//!
//! Wire parsing lives elsewhere; by the time a packet reaches this crate it
//! already carries a stream timestamp and a duration in the same unit.
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


use crate::units::{Seqnum, StreamSource, StreamTimestamp};
use bytes::Bytes;

/// Packet carries audio samples
pub const FLAG_AUDIO: u32 = 1 << 0;
/// Packet was reconstructed from repair symbols
pub const FLAG_RESTORED: u32 = 1 << 1;

/// Timestamped packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Source identifier of the sender
    pub source_id: StreamSource,
    /// Sequence number
    pub seqnum: Seqnum,
    /// Timestamp of the first sample
    pub stream_timestamp: StreamTimestamp,
    /// Number of samples per channel
    pub duration: StreamTimestamp,
    /// Packet flags (`FLAG_*`)
    pub flags: u32,
    /// Payload bytes
    pub payload: Bytes,
}

impl Packet {
    /// Create an audio packet
    pub fn new(
        seqnum: Seqnum,
        stream_timestamp: StreamTimestamp,
        duration: StreamTimestamp,
        payload: Bytes,
    ) -> Self {
        Packet {
            source_id: 0,
            seqnum,
            stream_timestamp,
            duration,
            flags: FLAG_AUDIO,
            payload,
        }
    }

    /// Set the source identifier
    pub fn with_source(mut self, source_id: StreamSource) -> Self {
        self.source_id = source_id;
        self
    }

    /// Add flags
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    /// Timestamp just past the last sample
    pub fn end_timestamp(&self) -> StreamTimestamp {
        self.stream_timestamp.wrapping_add(self.duration)
    }

    /// Check flags
    pub fn has_flags(&self, flags: u32) -> bool {
        self.flags & flags == flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_timestamp_wraps() {
        let packet = Packet::new(1, u32::MAX - 5, 10, Bytes::from_static(b"x"));
        assert_eq!(packet.end_timestamp(), 4);
    }

    #[test]
    fn test_flags() {
        let packet = Packet::new(1, 0, 10, Bytes::new()).with_flags(FLAG_RESTORED);
        assert!(packet.has_flags(FLAG_AUDIO));
        assert!(packet.has_flags(FLAG_AUDIO | FLAG_RESTORED));
        assert!(!Packet::new(2, 0, 10, Bytes::new()).has_flags(FLAG_RESTORED));
    }
}
