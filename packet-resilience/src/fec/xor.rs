//! XOR parity block code
//!
//! One repair symbol per block: the XOR of every source symbol. Recovers a
//! single lost source symbol. Cheap enough for low-loss VoIP links where
//! Reed-Solomon is overkill.
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


use super::block_codec::{BlockDecoder, BlockEncoder};
use super::symbol_store::{validate_shape, SymbolStore};
use super::FecCodecConfig;
use crate::error::ResilienceResult;
use bytes::Bytes;
use tracing::debug;

/// Same ceiling as Reed-Solomon so schemes can be swapped without reshaping blocks
pub const MAX_BLOCK_LENGTH: usize = 255;

/// Parity is a single symbol
const MAX_REPAIR_LENGTH: usize = 1;

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// XOR parity decoder
pub struct XorParityDecoder {
    store: SymbolStore,
    max_block_length: usize,
    init_status: ResilienceResult<()>,
    decoded: bool,
}

impl XorParityDecoder {
    /// Create a decoder; check `init_status` before use
    pub fn new(config: &FecCodecConfig) -> Self {
        let (max_block_length, init_status) = config.init_limit(MAX_BLOCK_LENGTH, "xor decoder");

        XorParityDecoder {
            store: SymbolStore::new("xor decoder"),
            max_block_length,
            init_status,
            decoded: false,
        }
    }

    fn check_init(&self) {
        assert!(
            self.init_status.is_ok(),
            "xor decoder: used after failed initialization"
        );
    }

    fn decode(&mut self) {
        self.decoded = true;

        let missing = self.store.missing_source();
        let &[lost] = missing.as_slice() else {
            if missing.len() > 1 {
                debug!(
                    sblen = self.store.sblen(),
                    missing = missing.len(),
                    "xor decoder: more than one source symbol lost"
                );
            }
            return;
        };

        let Some(parity) = self.store.present_repair().next().map(|(_, b)| b.clone()) else {
            return;
        };

        let mut recovered = parity.to_vec();
        for (_, source) in self.store.present_source() {
            xor_into(&mut recovered, source);
        }

        self.store.set(lost, Some(Bytes::from(recovered)));
        debug!(index = lost, "xor decoder: repaired block");
    }
}

impl BlockDecoder for XorParityDecoder {
    fn init_status(&self) -> ResilienceResult<()> {
        self.init_status.clone()
    }

    fn max_block_length(&self) -> usize {
        self.check_init();
        self.max_block_length
    }

    fn begin_block(
        &mut self,
        sblen: usize,
        rblen: usize,
        payload_size: usize,
    ) -> ResilienceResult<()> {
        self.check_init();
        validate_shape(sblen, rblen, payload_size, self.max_block_length, MAX_REPAIR_LENGTH)?;

        self.store.begin(sblen, rblen, payload_size)?;
        self.decoded = false;
        Ok(())
    }

    fn set_buffer(&mut self, index: usize, buffer: Option<Bytes>) {
        self.check_init();
        self.store.set(index, buffer);
        self.decoded = false;
    }

    fn repair_buffer(&mut self, index: usize) -> Option<Bytes> {
        self.check_init();
        if !self.decoded && self.store.is_open() {
            self.decode();
        }
        self.store.get(index).cloned()
    }

    fn end_block(&mut self) {
        self.check_init();
        self.store.end();
        self.decoded = false;
    }
}

/// XOR parity encoder
pub struct XorParityEncoder {
    store: SymbolStore,
    max_block_length: usize,
    init_status: ResilienceResult<()>,
}

impl XorParityEncoder {
    /// Create an encoder; check `init_status` before use
    pub fn new(config: &FecCodecConfig) -> Self {
        let (max_block_length, init_status) = config.init_limit(MAX_BLOCK_LENGTH, "xor encoder");

        XorParityEncoder {
            store: SymbolStore::new("xor encoder"),
            max_block_length,
            init_status,
        }
    }

    fn check_init(&self) {
        assert!(
            self.init_status.is_ok(),
            "xor encoder: used after failed initialization"
        );
    }
}

impl BlockEncoder for XorParityEncoder {
    fn init_status(&self) -> ResilienceResult<()> {
        self.init_status.clone()
    }

    fn max_block_length(&self) -> usize {
        self.check_init();
        self.max_block_length
    }

    fn begin_block(
        &mut self,
        sblen: usize,
        rblen: usize,
        payload_size: usize,
    ) -> ResilienceResult<()> {
        self.check_init();
        validate_shape(sblen, rblen, payload_size, self.max_block_length, MAX_REPAIR_LENGTH)?;
        self.store.begin(sblen, rblen, payload_size)
    }

    fn set_buffer(&mut self, index: usize, buffer: Bytes) {
        self.check_init();
        assert!(
            index < self.store.sblen() || !self.store.is_open(),
            "xor encoder: set_buffer() index is not a source symbol: index={}",
            index
        );
        self.store.set(index, Some(buffer));
    }

    fn fill_buffers(&mut self) {
        self.check_init();
        let missing = self.store.missing_source();
        assert!(
            missing.is_empty(),
            "xor encoder: fill_buffers() with missing source symbols: {:?}",
            missing
        );

        if self.store.rblen() == 0 {
            return;
        }

        let mut parity = vec![0u8; self.store.payload_size()];
        for (_, source) in self.store.present_source() {
            xor_into(&mut parity, source);
        }
        let sblen = self.store.sblen();
        self.store.set(sblen, Some(Bytes::from(parity)));
    }

    fn repair_buffer(&self, index: usize) -> Option<Bytes> {
        self.check_init();
        assert!(
            index >= self.store.sblen() || !self.store.is_open(),
            "xor encoder: repair_buffer() index is not a repair symbol: index={}",
            index
        );
        self.store.get(index).cloned()
    }

    fn end_block(&mut self) {
        self.check_init();
        self.store.end();
    }
}
