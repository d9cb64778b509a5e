//! Payload type registry
//!
//! Maps RTP payload types to the sample format carried by the stream. Shared
//! between stream contexts, so every access takes one coarse lock.
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
use crate::packet::FLAG_AUDIO;
use crate::sample_spec::{ChannelLayout, SampleSpec};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// L16 stereo, 44.1kHz (RFC 3551)
pub const PAYLOAD_TYPE_L16_STEREO: u8 = 10;
/// L16 mono, 44.1kHz (RFC 3551)
pub const PAYLOAD_TYPE_L16_MONO: u8 = 11;

/// PCM sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEncoding {
    SInt16,
    SInt24,
    Float32,
}

/// PCM byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEndian {
    Big,
    Little,
}

/// PCM sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub encoding: PcmEncoding,
    pub endian: PcmEndian,
}

/// Stream format bound to a payload type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// RTP payload type
    pub payload_type: u8,
    /// Encoding of samples on the wire
    pub pcm_format: PcmFormat,
    /// Rate and channels
    pub sample_spec: SampleSpec,
    /// Flags set on packets of this format
    pub packet_flags: u32,
}

#[derive(Default)]
struct Index {
    by_payload_type: BTreeMap<u8, Format>,
    // registration order, for lookups by sample spec
    order: Vec<u8>,
}

impl Index {
    fn insert(&mut self, format: Format) {
        self.order.push(format.payload_type);
        self.by_payload_type.insert(format.payload_type, format);
    }
}

/// Thread-safe payload type registry
pub struct FormatMap {
    index: Mutex<Index>,
}

impl FormatMap {
    /// Create a registry holding the builtin L16 formats
    pub fn new() -> Self {
        let l16 = PcmFormat {
            encoding: PcmEncoding::SInt16,
            endian: PcmEndian::Big,
        };

        let mut index = Index::default();
        index.insert(Format {
            payload_type: PAYLOAD_TYPE_L16_MONO,
            pcm_format: l16,
            sample_spec: SampleSpec::new(44100, ChannelLayout::Mono),
            packet_flags: FLAG_AUDIO,
        });
        index.insert(Format {
            payload_type: PAYLOAD_TYPE_L16_STEREO,
            pcm_format: l16,
            sample_spec: SampleSpec::new(44100, ChannelLayout::Stereo),
            packet_flags: FLAG_AUDIO,
        });

        FormatMap {
            index: Mutex::new(index),
        }
    }

    /// Look up a format by payload type
    pub fn find_by_pt(&self, payload_type: u8) -> Option<Format> {
        self.lock().by_payload_type.get(&payload_type).cloned()
    }

    /// Look up the first registered format with the given sample spec
    pub fn find_by_spec(&self, spec: &SampleSpec) -> Option<Format> {
        let index = self.lock();
        index
            .order
            .iter()
            .filter_map(|pt| index.by_payload_type.get(pt))
            .find(|format| format.sample_spec == *spec)
            .cloned()
    }

    /// Register a format
    pub fn add_format(&self, format: Format) -> ResilienceResult<()> {
        if format.payload_type == 0 {
            return Err(ResilienceError::BadArg(
                "format map: invalid payload type 0".to_string(),
            ));
        }
        if !format.sample_spec.is_valid() {
            return Err(ResilienceError::BadArg(format!(
                "format map: invalid sample spec for payload type {}",
                format.payload_type
            )));
        }

        let mut index = self.lock();
        if index.by_payload_type.contains_key(&format.payload_type) {
            warn!(
                payload_type = format.payload_type,
                "format map: failed to register format: payload type already exists"
            );
            return Err(ResilienceError::FormatExists {
                payload_type: format.payload_type,
            });
        }

        index.insert(format);
        Ok(())
    }

    /// Number of registered formats
    pub fn len(&self) -> usize {
        self.lock().by_payload_type.len()
    }

    /// Registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Index> {
        // the index stays consistent even if a holder panicked
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FormatMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn opus_like(payload_type: u8) -> Format {
        Format {
            payload_type,
            pcm_format: PcmFormat {
                encoding: PcmEncoding::Float32,
                endian: PcmEndian::Little,
            },
            sample_spec: SampleSpec::new(48000, ChannelLayout::Stereo),
            packet_flags: FLAG_AUDIO,
        }
    }

    #[test]
    fn test_builtin_formats() {
        let map = FormatMap::new();
        assert_eq!(map.len(), 2);

        let mono = map.find_by_pt(PAYLOAD_TYPE_L16_MONO).unwrap();
        assert_eq!(mono.sample_spec.num_channels(), 1);
        assert_eq!(mono.pcm_format.encoding, PcmEncoding::SInt16);
        assert_eq!(mono.pcm_format.endian, PcmEndian::Big);

        let stereo = map.find_by_pt(PAYLOAD_TYPE_L16_STEREO).unwrap();
        assert_eq!(stereo.sample_spec.sample_rate, 44100);
        assert_eq!(stereo.sample_spec.num_channels(), 2);

        assert!(map.find_by_pt(96).is_none());
    }

    #[test]
    fn test_find_by_spec() {
        let map = FormatMap::new();
        let spec = SampleSpec::new(44100, ChannelLayout::Stereo);
        assert_eq!(map.find_by_spec(&spec).map(|f| f.payload_type), Some(PAYLOAD_TYPE_L16_STEREO));

        let unknown = SampleSpec::new(8000, ChannelLayout::Mono);
        assert!(map.find_by_spec(&unknown).is_none());
    }

    #[test]
    fn test_find_by_spec_first_registered_wins() {
        let map = FormatMap::new();
        map.add_format(opus_like(97)).unwrap();
        map.add_format(opus_like(96)).unwrap();

        let spec = SampleSpec::new(48000, ChannelLayout::Stereo);
        assert_eq!(map.find_by_spec(&spec).map(|f| f.payload_type), Some(97));
    }

    #[test]
    fn test_add_duplicate() {
        let map = FormatMap::new();
        map.add_format(opus_like(96)).unwrap();
        assert_eq!(
            map.add_format(opus_like(96)),
            Err(ResilienceError::FormatExists { payload_type: 96 })
        );
        assert_eq!(
            map.add_format(opus_like(PAYLOAD_TYPE_L16_MONO)),
            Err(ResilienceError::FormatExists {
                payload_type: PAYLOAD_TYPE_L16_MONO
            })
        );
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_add_invalid() {
        let map = FormatMap::new();
        assert!(matches!(map.add_format(opus_like(0)), Err(ResilienceError::BadArg(_))));

        let mut bad = opus_like(100);
        bad.sample_spec = SampleSpec::new(0, ChannelLayout::Mono);
        assert!(matches!(map.add_format(bad), Err(ResilienceError::BadArg(_))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_concurrent_registration() {
        let map = Arc::new(FormatMap::new());

        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for i in 0..10u8 {
                        let pt = 20 + t * 10 + i;
                        map.add_format(opus_like(pt)).unwrap();
                        assert_eq!(map.find_by_pt(pt).map(|f| f.payload_type), Some(pt));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.len(), 2 + 80);
    }
}
