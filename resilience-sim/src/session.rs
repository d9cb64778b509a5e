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

//! Sending and receiving ends of a simulated FEC-protected stream

use bytes::Bytes;
use packet_resilience::{
    encode_block, BlockDecoder, BlockEncoder, DelayedReader, Packet, PacketQueue, PacketReader,
    PacketWriter, ResilienceResult, Seqnum, StreamSource, StreamTimestamp,
    FLAG_RESTORED,
};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// What the receiver learns about a block out of band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub first_seqnum: Seqnum,
    pub first_timestamp: StreamTimestamp,
    pub sblen: usize,
    pub rblen: usize,
    pub payload_size: usize,
}

/// An encoded block ready for transmission
pub struct SentBlock {
    pub header: BlockHeader,
    /// Source symbols followed by repair symbols
    pub symbols: Vec<Bytes>,
}

/// Generates audio payloads and protects them block by block
pub struct BlockSender {
    encoder: Box<dyn BlockEncoder>,
    rng: StdRng,
    rblen: usize,
    payload_size: usize,
    packet_duration: StreamTimestamp,
    next_seqnum: Seqnum,
    next_timestamp: StreamTimestamp,
}

impl BlockSender {
    pub fn new(
        encoder: Box<dyn BlockEncoder>,
        rng: StdRng,
        rblen: usize,
        payload_size: usize,
        packet_duration: StreamTimestamp,
    ) -> Self {
        BlockSender {
            encoder,
            rng,
            rblen,
            payload_size,
            packet_duration,
            next_seqnum: 0,
            next_timestamp: 0,
        }
    }

    /// Produce and encode the next `count` packets
    pub fn send_block(&mut self, count: usize) -> ResilienceResult<SentBlock> {
        let sources: Vec<Bytes> = (0..count)
            .map(|_| {
                let mut payload = vec![0u8; self.payload_size];
                self.rng.fill(&mut payload[..]);
                Bytes::from(payload)
            })
            .collect();

        let repairs = encode_block(self.encoder.as_mut(), &sources, self.rblen, self.payload_size)?;

        let header = BlockHeader {
            first_seqnum: self.next_seqnum,
            first_timestamp: self.next_timestamp,
            sblen: count,
            rblen: repairs.len(),
            payload_size: self.payload_size,
        };

        self.next_seqnum = self.next_seqnum.wrapping_add(count as Seqnum);
        self.next_timestamp = self
            .next_timestamp
            .wrapping_add(self.packet_duration.wrapping_mul(count as StreamTimestamp));

        Ok(SentBlock {
            header,
            symbols: sources.into_iter().chain(repairs).collect(),
        })
    }
}

/// Receiver-side counters
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReceiverStats {
    /// Packets handed to playback
    pub delivered: usize,
    /// Delivered packets that were rebuilt by FEC
    pub repaired: usize,
    /// Source packets FEC could not rebuild
    pub lost: usize,
    /// Packets refused by the full receive queue
    pub overflowed: usize,
}

/// Repairs incoming blocks and feeds them through the jitter buffer
pub struct BlockReceiver {
    decoder: Box<dyn BlockDecoder>,
    reader: DelayedReader<PacketQueue>,
    source_id: StreamSource,
    packet_duration: StreamTimestamp,
    packet_flags: u32,
    stats: ReceiverStats,
}

impl BlockReceiver {
    pub fn new(
        decoder: Box<dyn BlockDecoder>,
        reader: DelayedReader<PacketQueue>,
        source_id: StreamSource,
        packet_duration: StreamTimestamp,
        packet_flags: u32,
    ) -> Self {
        BlockReceiver {
            decoder,
            reader,
            source_id,
            packet_duration,
            packet_flags,
            stats: ReceiverStats::default(),
        }
    }

    /// Take the symbols of one block as they arrived, repair what can be
    /// repaired and queue the source packets in order
    pub fn receive_block(
        &mut self,
        header: &BlockHeader,
        arrivals: Vec<(usize, Bytes)>,
    ) -> ResilienceResult<()> {
        let mut arrived = vec![false; header.sblen];

        self.decoder
            .begin_block(header.sblen, header.rblen, header.payload_size)?;
        for (index, symbol) in arrivals {
            if index < header.sblen {
                arrived[index] = true;
            }
            self.decoder.set_buffer(index, Some(symbol));
        }

        let mut result = Ok(());
        for (index, was_received) in arrived.iter().enumerate() {
            let seqnum = header.first_seqnum.wrapping_add(index as Seqnum);
            let Some(payload) = self.decoder.repair_buffer(index) else {
                debug!(seqnum = seqnum, "receiver: source packet lost");
                self.stats.lost += 1;
                continue;
            };

            let timestamp = header
                .first_timestamp
                .wrapping_add(self.packet_duration.wrapping_mul(index as StreamTimestamp));
            let mut packet = Packet::new(seqnum, timestamp, self.packet_duration, payload)
                .with_source(self.source_id)
                .with_flags(self.packet_flags);
            if !was_received {
                packet = packet.with_flags(FLAG_RESTORED);
            }

            match self.reader.get_mut().write(packet) {
                Ok(()) => {}
                // a full queue or a failed allocation costs this packet only
                Err(e) if e.is_recoverable() => {
                    warn!(seqnum = seqnum, error = %e, "receiver: dropping packet");
                    self.stats.overflowed += 1;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.decoder.end_block();
        result
    }

    /// Release the next packet due for playback, if any
    pub fn poll(&mut self) -> ResilienceResult<Option<Packet>> {
        let packet = self.reader.read()?;
        if let Some(packet) = &packet {
            self.stats.delivered += 1;
            if packet.has_flags(FLAG_RESTORED) {
                self.stats.repaired += 1;
            }
        }
        Ok(packet)
    }

    /// Packets still waiting, upstream or inside the jitter buffer
    pub fn pending(&self) -> usize {
        self.reader.queued_packets() + self.reader.get_ref().len()
    }

    /// Packets the jitter buffer discarded to hold its latency target
    pub fn trimmed(&self) -> usize {
        self.reader.trimmed_packets()
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }
}
