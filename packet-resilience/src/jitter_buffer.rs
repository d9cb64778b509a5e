//! Jitter buffer
//!
//! [`DelayedReader`] sits between a packet source and the playback side. It
//! holds packets back until `target_delay` worth of audio has accumulated,
//! then hands them out in order. If the source delivered a burst, the excess
//! is dropped from the front so the latency stays bounded.
//!
//! Buffered duration is measured on stream timestamps (start of the oldest
//! packet to end of the newest one), not by counting packets.
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


use crate::error::ResilienceResult;
use crate::packet::Packet;
use crate::packet_queue::PacketQueue;
use crate::reader::{PacketReader, PacketWriter};
use crate::sample_spec::SampleSpec;
use crate::units::{stream_timestamp_diff, StreamTimestamp};
use std::time::Duration;
use tracing::{debug, error};

/// Jitter buffer configuration
#[derive(Debug, Clone)]
pub struct JitterBufferConfig {
    /// Playback delay to accumulate before releasing packets
    pub target_latency: Duration,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        JitterBufferConfig {
            target_latency: Duration::from_millis(40),
        }
    }
}

/// Delays packets from an upstream reader by a fixed target latency
pub struct DelayedReader<R> {
    reader: R,
    queue: PacketQueue,
    delay: StreamTimestamp,
    started: bool,
    trimmed: usize,
    sample_spec: SampleSpec,
}

impl<R: PacketReader> DelayedReader<R> {
    /// Create a delayed reader on top of `reader`
    pub fn new(reader: R, target_delay: Duration, sample_spec: SampleSpec) -> Self {
        let delay = sample_spec.ns_to_stream_timestamp(target_delay);

        debug!(
            delay = delay,
            delay_ms = sample_spec.stream_timestamp_to_ms(delay),
            "delayed reader: initializing"
        );

        DelayedReader {
            reader,
            queue: PacketQueue::new(),
            delay,
            started: false,
            trimmed: 0,
            sample_spec,
        }
    }

    /// Create a delayed reader from configuration
    pub fn with_config(reader: R, config: &JitterBufferConfig, sample_spec: SampleSpec) -> Self {
        Self::new(reader, config.target_latency, sample_spec)
    }

    /// Target delay in stream timestamp units
    pub fn target_delay(&self) -> StreamTimestamp {
        self.delay
    }

    /// Initial delay was reached and packets are being released
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Duration currently held back, in stream timestamp units
    pub fn queued_duration(&self) -> StreamTimestamp {
        self.queue_size()
    }

    /// Number of packets currently held back
    pub fn queued_packets(&self) -> usize {
        self.queue.len()
    }

    /// Upstream reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Upstream reader, mutably
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Packets discarded so far to bring the queue back to the target delay
    pub fn trimmed_packets(&self) -> usize {
        self.trimmed
    }

    /// Pull everything upstream has right now.
    ///
    /// Returns true once the queue spans at least the target delay.
    fn fetch_packets(&mut self) -> ResilienceResult<bool> {
        while let Some(packet) = self.reader.read()? {
            self.queue.write(packet)?;
        }

        let qs = self.queue_size();
        if qs < self.delay {
            return Ok(false);
        }

        debug!(
            delay = self.delay,
            delay_ms = self.sample_spec.stream_timestamp_to_ms(self.delay),
            queue = qs,
            queue_ms = self.sample_spec.stream_timestamp_to_ms(qs),
            packets = self.queue.len(),
            "delayed reader: initial queue"
        );

        Ok(true)
    }

    /// Pop the oldest packet, discarding from the front first while the rest
    /// of the queue would still cover the target delay.
    fn read_queued_packet(&mut self) -> Option<Packet> {
        let mut trimmed_qs: StreamTimestamp = 0;
        let mut discarded = 0usize;

        loop {
            let packet = self.queue.pop()?;

            let new_qs = self.queue_size();
            if self.queue.is_empty() || new_qs < self.delay {
                if discarded != 0 {
                    self.trimmed += discarded;
                    debug!(
                        delay = self.delay,
                        delay_ms = self.sample_spec.stream_timestamp_to_ms(self.delay),
                        queue = trimmed_qs,
                        queue_ms = self.sample_spec.stream_timestamp_to_ms(trimmed_qs),
                        packets = self.queue.len() + 1,
                        discarded = discarded,
                        "delayed reader: trimmed queue"
                    );
                }
                return Some(packet);
            }

            trimmed_qs = new_qs;
            discarded += 1;
        }
    }

    fn queue_size(&self) -> StreamTimestamp {
        let (Some(head), Some(tail)) = (self.queue.head(), self.queue.tail()) else {
            return 0;
        };

        let qs = stream_timestamp_diff(tail.end_timestamp(), head.stream_timestamp);
        if qs < 0 {
            error!(queue = qs, "delayed reader: unexpected negative queue size");
            return 0;
        }

        qs as StreamTimestamp
    }
}

impl<R: PacketReader> PacketReader for DelayedReader<R> {
    fn read(&mut self) -> ResilienceResult<Option<Packet>> {
        if !self.started {
            if !self.fetch_packets()? {
                return Ok(None);
            }
            self.started = true;
        }

        if !self.queue.is_empty() {
            return Ok(self.read_queued_packet());
        }

        self.reader.read()
    }
}
