//! Pull-based packet source and push-based packet sink
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

/// Packet source
///
/// `read` returns packets one at a time in the order they were accepted.
/// `Ok(None)` means "no packet right now": the source is drained, the caller
/// may retry later. It leaves the source untouched and is not an error.
pub trait PacketReader {
    /// Read the next packet
    fn read(&mut self) -> ResilienceResult<Option<Packet>>;
}

/// Packet sink
pub trait PacketWriter {
    /// Write a packet
    fn write(&mut self, packet: Packet) -> ResilienceResult<()>;
}

impl<R: PacketReader + ?Sized> PacketReader for &mut R {
    fn read(&mut self) -> ResilienceResult<Option<Packet>> {
        (**self).read()
    }
}

impl<R: PacketReader + ?Sized> PacketReader for Box<R> {
    fn read(&mut self) -> ResilienceResult<Option<Packet>> {
        (**self).read()
    }
}

impl<W: PacketWriter + ?Sized> PacketWriter for &mut W {
    fn write(&mut self, packet: Packet) -> ResilienceResult<()> {
        (**self).write(packet)
    }
}

impl<W: PacketWriter + ?Sized> PacketWriter for Box<W> {
    fn write(&mut self, packet: Packet) -> ResilienceResult<()> {
        (**self).write(packet)
    }
}
