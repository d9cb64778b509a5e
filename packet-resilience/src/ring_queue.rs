//! Fixed-capacity queue on a contiguous buffer
//!
//! Supports pushing and popping at both ends in O(1). The storage is
//! allocated once at construction and never grows.
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

/// Bounded double-ended queue
pub struct RingQueue<T> {
    buf: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingQueue<T> {
    /// Create a queue holding at most `capacity` elements
    pub fn with_capacity(capacity: usize) -> ResilienceResult<Self> {
        if capacity == 0 {
            return Err(ResilienceError::BadArg(
                "ring queue capacity must be greater than 0".to_string(),
            ));
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)?;
        buf.resize_with(capacity, || None);

        Ok(RingQueue { buf, head: 0, len: 0 })
    }

    /// Maximum number of elements
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Current number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Queue holds no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Queue holds `capacity()` elements
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// Front element
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.buf[self.head].as_ref()
    }

    /// Back element
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.buf[self.slot(self.len - 1)].as_ref()
    }

    /// Push to the front; hands the element back if the queue is full
    pub fn push_front(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.head = (self.head + self.buf.len() - 1) % self.buf.len();
        self.buf[self.head] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Push to the back; hands the element back if the queue is full
    pub fn push_back(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let tail = self.slot(self.len);
        self.buf[tail] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Remove the front element
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.buf[self.head].take();
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        value
    }

    /// Remove the back element
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let tail = self.slot(self.len - 1);
        self.len -= 1;
        self.buf[tail].take()
    }

    /// Iterate from front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.buf[self.slot(i)].as_ref())
    }

    /// Drop every element
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
        self.head = 0;
    }

    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.buf.len()
    }
}
