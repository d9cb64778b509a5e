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

//! Lossy network channel

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::Rng;

/// Drops symbols at random and swaps neighbours to mimic jitter.
///
/// Reordering never crosses a block boundary.
pub struct LossyChannel {
    rng: StdRng,
    loss_rate: f64,
    reorder_rate: f64,
    dropped: usize,
}

impl LossyChannel {
    pub fn new(rng: StdRng, loss_rate: f64, reorder_rate: f64) -> Self {
        LossyChannel {
            rng,
            loss_rate: loss_rate.clamp(0.0, 1.0),
            reorder_rate: reorder_rate.clamp(0.0, 1.0),
            dropped: 0,
        }
    }

    /// Send one block; returns the surviving `(index, symbol)` pairs in
    /// arrival order
    pub fn transmit(&mut self, symbols: &[Bytes]) -> Vec<(usize, Bytes)> {
        let mut arrivals: Vec<(usize, Bytes)> = Vec::with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            if self.rng.gen_bool(self.loss_rate) {
                self.dropped += 1;
                continue;
            }
            arrivals.push((index, symbol.clone()));
        }

        let mut i = 1;
        while i < arrivals.len() {
            if self.rng.gen_bool(self.reorder_rate) {
                arrivals.swap(i - 1, i);
                // don't move the same symbol twice
                i += 1;
            }
            i += 1;
        }

        arrivals
    }

    /// Symbols dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
