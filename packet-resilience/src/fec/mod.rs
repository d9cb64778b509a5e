//! Forward Error Correction (FEC)
//!
//! Block erasure codes for recovering lost packets without retransmission.
//! Callers pick a [`FecScheme`] at stream setup and then talk to the
//! [`BlockDecoder`] / [`BlockEncoder`] traits only.
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


pub mod block_codec;
pub mod gf256;
pub mod reed_solomon;
pub mod symbol_store;
pub mod xor;

pub use block_codec::{BlockDecoder, BlockEncoder};
pub use reed_solomon::{ReedSolomonDecoder, ReedSolomonEncoder};
pub use xor::{XorParityDecoder, XorParityEncoder};

use crate::error::{ResilienceError, ResilienceResult};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use tracing::error;

/// Available coding schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FecScheme {
    /// Systematic Reed-Solomon over GF(2^8), any number of repair symbols
    ReedSolomon8m,
    /// Single XOR parity symbol per block
    XorParity,
}

impl FecScheme {
    /// Largest `sblen + rblen` the scheme can handle
    pub fn max_block_length(&self) -> usize {
        match self {
            FecScheme::ReedSolomon8m => reed_solomon::MAX_BLOCK_LENGTH,
            FecScheme::XorParity => xor::MAX_BLOCK_LENGTH,
        }
    }
}

impl fmt::Display for FecScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FecScheme::ReedSolomon8m => write!(f, "rs8m"),
            FecScheme::XorParity => write!(f, "xor"),
        }
    }
}

impl FromStr for FecScheme {
    type Err = ResilienceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rs8m" | "reed-solomon" | "reedsolomon" => Ok(FecScheme::ReedSolomon8m),
            "xor" | "parity" => Ok(FecScheme::XorParity),
            other => Err(ResilienceError::BadArg(format!("unknown FEC scheme: {}", other))),
        }
    }
}

/// FEC codec configuration
#[derive(Debug, Clone, Default)]
pub struct FecCodecConfig {
    /// Cap on `sblen + rblen` below the scheme maximum (`None` for no cap)
    pub max_block_length: Option<usize>,
}

impl FecCodecConfig {
    /// Effective block length limit for a scheme whose own limit is `scheme_max`
    pub(crate) fn block_length_limit(&self, scheme_max: usize) -> ResilienceResult<usize> {
        match self.max_block_length {
            None => Ok(scheme_max),
            Some(0) => Err(ResilienceError::BadArg(
                "max block length must be greater than 0".to_string(),
            )),
            Some(n) if n > scheme_max => Err(ResilienceError::BadArg(format!(
                "max block length {} exceeds scheme limit {}",
                n, scheme_max
            ))),
            Some(n) => Ok(n),
        }
    }

    /// Block length limit and init status for the codec called `name`.
    ///
    /// An invalid configuration is logged and yields a zero limit.
    pub(crate) fn init_limit(
        &self,
        scheme_max: usize,
        name: &'static str,
    ) -> (usize, ResilienceResult<()>) {
        match self.block_length_limit(scheme_max) {
            Ok(n) => (n, Ok(())),
            Err(e) => {
                error!(codec = name, error = %e, "fec codec: invalid configuration");
                (0, Err(e))
            }
        }
    }
}

/// Create a decoder for `scheme`, failing if it did not initialize
pub fn new_block_decoder(
    scheme: FecScheme,
    config: &FecCodecConfig,
) -> ResilienceResult<Box<dyn BlockDecoder>> {
    let decoder: Box<dyn BlockDecoder> = match scheme {
        FecScheme::ReedSolomon8m => Box::new(ReedSolomonDecoder::new(config)),
        FecScheme::XorParity => Box::new(XorParityDecoder::new(config)),
    };
    decoder.init_status()?;
    Ok(decoder)
}

/// Create an encoder for `scheme`, failing if it did not initialize
pub fn new_block_encoder(
    scheme: FecScheme,
    config: &FecCodecConfig,
) -> ResilienceResult<Box<dyn BlockEncoder>> {
    let encoder: Box<dyn BlockEncoder> = match scheme {
        FecScheme::ReedSolomon8m => Box::new(ReedSolomonEncoder::new(config)),
        FecScheme::XorParity => Box::new(XorParityEncoder::new(config)),
    };
    encoder.init_status()?;
    Ok(encoder)
}

/// Compute `rblen` repair symbols for `sources` in one go
pub fn encode_block(
    encoder: &mut dyn BlockEncoder,
    sources: &[Bytes],
    rblen: usize,
    payload_size: usize,
) -> ResilienceResult<Vec<Bytes>> {
    let sblen = sources.len();
    encoder.begin_block(sblen, rblen, payload_size)?;

    for (index, source) in sources.iter().enumerate() {
        encoder.set_buffer(index, source.clone());
    }
    encoder.fill_buffers();

    let repairs = (sblen..sblen + rblen)
        .filter_map(|index| encoder.repair_buffer(index))
        .collect();

    encoder.end_block();
    Ok(repairs)
}

/// Run a whole block through `decoder`.
///
/// `symbols` holds `sblen + rblen` slots, `None` for lost ones. Returns the
/// `sblen` source slots, with repaired symbols filled in where possible.
pub fn decode_block(
    decoder: &mut dyn BlockDecoder,
    symbols: &[Option<Bytes>],
    sblen: usize,
    payload_size: usize,
) -> ResilienceResult<Vec<Option<Bytes>>> {
    if symbols.len() < sblen {
        return Err(ResilienceError::BadArg(format!(
            "block has {} slots, expected at least {}",
            symbols.len(),
            sblen
        )));
    }
    let rblen = symbols.len() - sblen;
    decoder.begin_block(sblen, rblen, payload_size)?;

    for (index, symbol) in symbols.iter().enumerate() {
        decoder.set_buffer(index, symbol.clone());
    }

    let sources = (0..sblen).map(|index| decoder.repair_buffer(index)).collect();

    decoder.end_block();
    Ok(sources)
}
