//! Stream timestamp units
//!
//! Stream timestamps count samples per channel and wrap around at 2^32.
//! Every comparison goes through the signed distance so that ordering keeps
//! working across the wrap.
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


/// Stream timestamp (samples per channel, wraps around)
pub type StreamTimestamp = u32;

/// Signed distance between two stream timestamps
pub type StreamTimestampDiff = i32;

/// Packet sequence number (wraps around)
pub type Seqnum = u16;

/// Stream source identifier
pub type StreamSource = u32;

/// Signed distance `a - b`, correct across wraparound as long as the two
/// timestamps are less than 2^31 apart
#[inline]
pub fn stream_timestamp_diff(a: StreamTimestamp, b: StreamTimestamp) -> StreamTimestampDiff {
    a.wrapping_sub(b) as StreamTimestampDiff
}
