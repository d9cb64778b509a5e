//! Symbol buffer store
//!
//! Holds the buffer of every source and repair slot of the block being
//! processed. Buffers are reference-counted and are only held between
//! `begin` and `end`.
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
use bytes::Bytes;

/// Check a block shape against scheme limits
pub fn validate_shape(
    sblen: usize,
    rblen: usize,
    payload_size: usize,
    max_block_length: usize,
    max_repair_length: usize,
) -> ResilienceResult<()> {
    if sblen == 0 {
        return Err(ResilienceError::BadArg(
            "source block length must be greater than 0".to_string(),
        ));
    }
    if payload_size == 0 {
        return Err(ResilienceError::BadArg(
            "payload size must be greater than 0".to_string(),
        ));
    }
    if sblen.checked_add(rblen).map_or(true, |n| n > max_block_length) {
        return Err(ResilienceError::BadArg(format!(
            "block too long: sblen={} rblen={} max={}",
            sblen, rblen, max_block_length
        )));
    }
    if rblen > max_repair_length {
        return Err(ResilienceError::BadArg(format!(
            "too many repair symbols: rblen={} max={}",
            rblen, max_repair_length
        )));
    }
    Ok(())
}

/// Per-block symbol slots
pub struct SymbolStore {
    name: &'static str,
    slots: Vec<Option<Bytes>>,
    sblen: usize,
    rblen: usize,
    payload_size: usize,
    open: bool,
}

impl SymbolStore {
    /// Create an empty store; `name` prefixes contract violation messages
    pub fn new(name: &'static str) -> Self {
        SymbolStore {
            name,
            slots: Vec::new(),
            sblen: 0,
            rblen: 0,
            payload_size: 0,
            open: false,
        }
    }

    /// Open a block with every slot empty
    pub fn begin(&mut self, sblen: usize, rblen: usize, payload_size: usize) -> ResilienceResult<()> {
        assert!(!self.open, "{}: begin_block() called twice", self.name);

        let block_length = sblen.checked_add(rblen).ok_or_else(|| {
            ResilienceError::BadArg(format!(
                "{}: block length overflow: sblen={} rblen={}",
                self.name, sblen, rblen
            ))
        })?;
        self.slots.clear();
        self.slots
            .try_reserve_exact(block_length)
            .map_err(|e| ResilienceError::NoMem(format!("{}: {}", self.name, e)))?;
        self.slots.resize(block_length, None);

        self.sblen = sblen;
        self.rblen = rblen;
        self.payload_size = payload_size;
        self.open = true;

        Ok(())
    }

    /// Drop every slot and close the block
    pub fn end(&mut self) {
        self.check_open("end_block");
        self.slots.clear();
        self.open = false;
    }

    /// A block is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of source slots
    pub fn sblen(&self) -> usize {
        self.sblen
    }

    /// Number of repair slots
    pub fn rblen(&self) -> usize {
        self.rblen
    }

    /// Size of every symbol
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Store a symbol; `None` or an empty buffer leaves the slot missing
    pub fn set(&mut self, index: usize, buffer: Option<Bytes>) {
        self.check_open("set_buffer");
        self.check_index(index);

        let buffer = buffer.filter(|b| !b.is_empty());
        if let Some(buf) = &buffer {
            assert!(
                buf.len() == self.payload_size,
                "{}: buffer size mismatch: index={} size={} payload_size={}",
                self.name,
                index,
                buf.len(),
                self.payload_size
            );
        }

        self.slots[index] = buffer;
    }

    /// Symbol at `index`, if present
    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.check_open("repair_buffer");
        self.check_index(index);
        self.slots[index].as_ref()
    }

    /// Source slots that have no buffer
    pub fn missing_source(&self) -> Vec<usize> {
        (0..self.sblen).filter(|&i| self.slots[i].is_none()).collect()
    }

    /// Present source symbols as `(index, buffer)`
    pub fn present_source(&self) -> impl Iterator<Item = (usize, &Bytes)> + '_ {
        self.slots[..self.sblen]
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (i, b)))
    }

    /// Present repair symbols as `(repair row, buffer)`, row counted from 0
    pub fn present_repair(&self) -> impl Iterator<Item = (usize, &Bytes)> + '_ {
        self.slots[self.sblen..]
            .iter()
            .enumerate()
            .filter_map(|(r, s)| s.as_ref().map(|b| (r, b)))
    }

    fn check_open(&self, op: &str) {
        assert!(self.open, "{}: {}() called outside of block", self.name, op);
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.slots.len(),
            "{}: symbol index out of bounds: index={} sblen={} rblen={}",
            self.name,
            index,
            self.sblen,
            self.rblen
        );
    }
}
