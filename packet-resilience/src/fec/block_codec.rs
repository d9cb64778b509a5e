//! FEC block codec interfaces
//!
//! A block is `sblen` source symbols followed by `rblen` repair symbols, all
//! `payload_size` bytes long. Slots are numbered `0..sblen` for source and
//! `sblen..sblen + rblen` for repair symbols.
//!
//! Every operation except `init_status` and `max_block_length` must happen
//! between `begin_block` and `end_block`; calling outside that window panics.
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
use bytes::Bytes;

/// FEC block decoder
pub trait BlockDecoder: Send {
    /// Construction status. A decoder that is not `Ok` must not be used.
    fn init_status(&self) -> ResilienceResult<()>;

    /// Maximum `sblen + rblen` supported by the scheme
    fn max_block_length(&self) -> usize;

    /// Prepare state for a block.
    ///
    /// Fails with `NoMem` if allocation fails and `BadArg` if the block shape
    /// is outside the scheme's limits.
    fn begin_block(
        &mut self,
        sblen: usize,
        rblen: usize,
        payload_size: usize,
    ) -> ResilienceResult<()>;

    /// Store a received source or repair symbol.
    ///
    /// `None` (or an empty buffer) marks the symbol as lost. A present
    /// buffer must be exactly `payload_size` bytes.
    fn set_buffer(&mut self, index: usize, buffer: Option<Bytes>);

    /// Get a source symbol, reconstructing it if it was lost.
    ///
    /// Returns `None` when not enough symbols were received to recover it.
    fn repair_buffer(&mut self, index: usize) -> Option<Bytes>;

    /// Release every buffer of the current block
    fn end_block(&mut self);
}

/// FEC block encoder
pub trait BlockEncoder: Send {
    /// Construction status. An encoder that is not `Ok` must not be used.
    fn init_status(&self) -> ResilienceResult<()>;

    /// Maximum `sblen + rblen` supported by the scheme
    fn max_block_length(&self) -> usize;

    /// Prepare state for a block
    fn begin_block(
        &mut self,
        sblen: usize,
        rblen: usize,
        payload_size: usize,
    ) -> ResilienceResult<()>;

    /// Store a source symbol of `payload_size` bytes
    fn set_buffer(&mut self, index: usize, buffer: Bytes);

    /// Compute the repair symbols. All source symbols must be set.
    fn fill_buffers(&mut self);

    /// Get a repair symbol computed by `fill_buffers`
    fn repair_buffer(&self, index: usize) -> Option<Bytes>;

    /// Release every buffer of the current block
    fn end_block(&mut self);
}
