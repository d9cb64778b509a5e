//! Reed-Solomon block code over GF(2^8)
//!
//! Systematic code: source symbols are sent as-is, repair symbol `r` is
//! `sum_j C[r][j] * source_j` with the Cauchy coefficients
//! `C[r][j] = 1 / ((sblen + r) + j)`. Every square sub-matrix of a Cauchy
//! matrix is invertible, so any `sblen` received symbols recover the block.
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
use super::gf256;
use super::symbol_store::{validate_shape, SymbolStore};
use super::FecCodecConfig;
use crate::error::ResilienceResult;
use bytes::Bytes;
use tracing::{debug, error};

/// Distinct field elements available for row and column labels
pub const MAX_BLOCK_LENGTH: usize = 255;

/// Cauchy coefficient for repair row `row` and source column `col`
fn coefficient(sblen: usize, row: usize, col: usize) -> u8 {
    // sblen + row < 255 and col < sblen, so the labels never collide
    gf256::inv((sblen + row) as u8 ^ col as u8)
}

/// Gauss-Jordan elimination of `matrix * x = rhs`, in place.
///
/// On success `rhs[k]` holds `x_k`. Returns false if the matrix is singular.
fn solve(matrix: &mut [Vec<u8>], rhs: &mut [Vec<u8>]) -> bool {
    let n = matrix.len();

    for col in 0..n {
        let Some(pivot) = (col..n).find(|&row| matrix[row][col] != 0) else {
            return false;
        };
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let scale = gf256::inv(matrix[col][col]);
        gf256::mul_slice(&mut matrix[col], scale);
        gf256::mul_slice(&mut rhs[col], scale);

        let pivot_row = matrix[col].clone();
        let pivot_rhs = rhs[col].clone();

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor != 0 {
                gf256::mul_add_slice(&mut matrix[row], &pivot_row, factor);
                gf256::mul_add_slice(&mut rhs[row], &pivot_rhs, factor);
            }
        }
    }

    true
}

/// Reed-Solomon block decoder
pub struct ReedSolomonDecoder {
    store: SymbolStore,
    max_block_length: usize,
    init_status: ResilienceResult<()>,
    decoded: bool,
}

impl ReedSolomonDecoder {
    /// Create a decoder; check `init_status` before use
    pub fn new(config: &FecCodecConfig) -> Self {
        let (max_block_length, init_status) = config.init_limit(MAX_BLOCK_LENGTH, "rs8m decoder");

        ReedSolomonDecoder {
            store: SymbolStore::new("rs8m decoder"),
            max_block_length,
            init_status,
            decoded: false,
        }
    }

    fn check_init(&self) {
        assert!(
            self.init_status.is_ok(),
            "rs8m decoder: used after failed initialization"
        );
    }

    fn decode(&mut self) {
        self.decoded = true;

        let missing = self.store.missing_source();
        if missing.is_empty() {
            return;
        }

        let sblen = self.store.sblen();
        let repairs: Vec<(usize, Bytes)> = self
            .store
            .present_repair()
            .take(missing.len())
            .map(|(row, buf)| (row, buf.clone()))
            .collect();

        if repairs.len() < missing.len() {
            debug!(
                sblen = sblen,
                rblen = self.store.rblen(),
                missing = missing.len(),
                repair = repairs.len(),
                "rs8m decoder: not enough symbols to repair block"
            );
            return;
        }

        // move the known source terms to the right-hand side
        let mut rhs: Vec<Vec<u8>> = Vec::with_capacity(repairs.len());
        for (row, repair) in &repairs {
            let mut syndrome = repair.to_vec();
            for (col, source) in self.store.present_source() {
                gf256::mul_add_slice(&mut syndrome, source, coefficient(sblen, *row, col));
            }
            rhs.push(syndrome);
        }

        let mut matrix: Vec<Vec<u8>> = repairs
            .iter()
            .map(|(row, _)| {
                missing
                    .iter()
                    .map(|&col| coefficient(sblen, *row, col))
                    .collect()
            })
            .collect();

        if !solve(&mut matrix, &mut rhs) {
            error!(
                sblen = sblen,
                missing = missing.len(),
                "rs8m decoder: singular decoding matrix"
            );
            return;
        }

        for (symbol, &index) in rhs.into_iter().zip(&missing) {
            self.store.set(index, Some(Bytes::from(symbol)));
        }

        debug!(
            sblen = sblen,
            repaired = missing.len(),
            "rs8m decoder: repaired block"
        );
    }
}

impl BlockDecoder for ReedSolomonDecoder {
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
        validate_shape(sblen, rblen, payload_size, self.max_block_length, usize::MAX)?;

        self.store.begin(sblen, rblen, payload_size)?;
        self.decoded = false;
        Ok(())
    }

    fn set_buffer(&mut self, index: usize, buffer: Option<Bytes>) {
        self.check_init();
        self.store.set(index, buffer);
        // a late symbol may make a failed repair possible
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

/// Reed-Solomon block encoder
pub struct ReedSolomonEncoder {
    store: SymbolStore,
    max_block_length: usize,
    init_status: ResilienceResult<()>,
}

impl ReedSolomonEncoder {
    /// Create an encoder; check `init_status` before use
    pub fn new(config: &FecCodecConfig) -> Self {
        let (max_block_length, init_status) = config.init_limit(MAX_BLOCK_LENGTH, "rs8m encoder");

        ReedSolomonEncoder {
            store: SymbolStore::new("rs8m encoder"),
            max_block_length,
            init_status,
        }
    }

    fn check_init(&self) {
        assert!(
            self.init_status.is_ok(),
            "rs8m encoder: used after failed initialization"
        );
    }
}

impl BlockEncoder for ReedSolomonEncoder {
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
        validate_shape(sblen, rblen, payload_size, self.max_block_length, usize::MAX)?;
        self.store.begin(sblen, rblen, payload_size)
    }

    fn set_buffer(&mut self, index: usize, buffer: Bytes) {
        self.check_init();
        assert!(
            index < self.store.sblen() || !self.store.is_open(),
            "rs8m encoder: set_buffer() index is not a source symbol: index={}",
            index
        );
        self.store.set(index, Some(buffer));
    }

    fn fill_buffers(&mut self) {
        self.check_init();
        let missing = self.store.missing_source();
        assert!(
            missing.is_empty(),
            "rs8m encoder: fill_buffers() with missing source symbols: {:?}",
            missing
        );

        let sblen = self.store.sblen();
        let payload_size = self.store.payload_size();

        for row in 0..self.store.rblen() {
            let mut repair = vec![0u8; payload_size];
            for (col, source) in self.store.present_source() {
                gf256::mul_add_slice(&mut repair, source, coefficient(sblen, row, col));
            }
            self.store.set(sblen + row, Some(Bytes::from(repair)));
        }
    }

    fn repair_buffer(&self, index: usize) -> Option<Bytes> {
        self.check_init();
        assert!(
            index >= self.store.sblen() || !self.store.is_open(),
            "rs8m encoder: repair_buffer() index is not a repair symbol: index={}",
            index
        );
        self.store.get(index).cloned()
    }

    fn end_block(&mut self) {
        self.check_init();
        self.store.end();
    }
}
