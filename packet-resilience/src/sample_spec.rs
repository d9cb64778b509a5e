//! Sample specification
//!
//! Converts wall-clock durations into the stream timestamp domain and back.
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


use crate::units::StreamTimestamp;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// One channel
    Mono,
    /// Two channels
    Stereo,
    /// Arbitrary number of channels
    Multitrack(u16),
}

impl ChannelLayout {
    /// Number of channels
    pub fn num_channels(&self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
            ChannelLayout::Multitrack(n) => *n,
        }
    }
}

/// Sample rate and channel layout of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleSpec {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Channel layout
    pub channels: ChannelLayout,
}

impl SampleSpec {
    /// Create a sample spec
    pub fn new(sample_rate: u32, channels: ChannelLayout) -> Self {
        SampleSpec {
            sample_rate,
            channels,
        }
    }

    /// Check that rate and channel count are non-zero
    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels.num_channels() > 0
    }

    /// Number of channels
    pub fn num_channels(&self) -> u16 {
        self.channels.num_channels()
    }

    /// Convert a duration into stream timestamp units, rounding to the
    /// nearest sample and saturating at the timestamp range
    pub fn ns_to_stream_timestamp(&self, duration: Duration) -> StreamTimestamp {
        let samples = (duration.as_nanos() * self.sample_rate as u128 + NANOS_PER_SEC / 2)
            / NANOS_PER_SEC;
        samples.min(StreamTimestamp::MAX as u128) as StreamTimestamp
    }

    /// Convert stream timestamp units into a duration
    pub fn stream_timestamp_to_duration(&self, ts: StreamTimestamp) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = ts as u128 * NANOS_PER_SEC / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Convert stream timestamp units into milliseconds, for logging
    pub fn stream_timestamp_to_ms(&self, ts: StreamTimestamp) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        ts as f64 * 1000.0 / self.sample_rate as f64
    }
}
