//! FIFO packet queue
//!
//! Network-facing code writes received packets here and the jitter buffer
//! reads them back. The queue can be bounded to cap memory use when the
//! consumer stalls.
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


use crate::error::{ResilienceError, ResilienceResult};
use crate::packet::Packet;
use crate::reader::{PacketReader, PacketWriter};
use crate::ring_queue::RingQueue;
use std::collections::VecDeque;

enum Storage {
    Unbounded(VecDeque<Packet>),
    Bounded(RingQueue<Packet>),
}

/// Packet FIFO
pub struct PacketQueue {
    storage: Storage,
}

impl PacketQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        PacketQueue {
            storage: Storage::Unbounded(VecDeque::new()),
        }
    }

    /// Create a queue holding at most `capacity` packets
    pub fn bounded(capacity: usize) -> ResilienceResult<Self> {
        Ok(PacketQueue {
            storage: Storage::Bounded(RingQueue::with_capacity(capacity)?),
        })
    }

    /// Number of queued packets
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Unbounded(queue) => queue.len(),
            Storage::Bounded(queue) => queue.len(),
        }
    }

    /// No packets queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest packet
    pub fn head(&self) -> Option<&Packet> {
        match &self.storage {
            Storage::Unbounded(queue) => queue.front(),
            Storage::Bounded(queue) => queue.front(),
        }
    }

    /// Newest packet
    pub fn tail(&self) -> Option<&Packet> {
        match &self.storage {
            Storage::Unbounded(queue) => queue.back(),
            Storage::Bounded(queue) => queue.back(),
        }
    }

    /// Remove the oldest packet
    pub fn pop(&mut self) -> Option<Packet> {
        match &mut self.storage {
            Storage::Unbounded(queue) => queue.pop_front(),
            Storage::Bounded(queue) => queue.pop_front(),
        }
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketWriter for PacketQueue {
    fn write(&mut self, packet: Packet) -> ResilienceResult<()> {
        match &mut self.storage {
            Storage::Unbounded(queue) => {
                queue.push_back(packet);
                Ok(())
            }
            Storage::Bounded(queue) => queue.push_back(packet).map_err(|rejected| {
                ResilienceError::NoSpace(format!(
                    "packet queue full: capacity={} seqnum={}",
                    queue.capacity(),
                    rejected.seqnum
                ))
            }),
        }
    }
}

impl PacketReader for PacketQueue {
    fn read(&mut self) -> ResilienceResult<Option<Packet>> {
        Ok(self.pop())
    }
}
