//! Error types for the packet resilience core
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


use thiserror::Error;

/// Result type for packet resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in the packet resilience core
///
/// "No data right now" is not an error: packet sources report it as
/// `Ok(None)`. Likewise an unrecoverable FEC loss is a `None` buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    /// Allocation failed while preparing an operation
    #[error("Out of memory: {0}")]
    NoMem(String),

    /// Invalid argument or configuration
    #[error("Invalid argument: {0}")]
    BadArg(String),

    /// Bounded queue has no room left
    #[error("No space left: {0}")]
    NoSpace(String),

    /// Payload type already registered
    #[error("Format already exists: payload type {payload_type}")]
    FormatExists { payload_type: u8 },

    /// Failure reported by an upstream packet source
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ResilienceError {
    /// True for errors that only concern the operation that raised them,
    /// so the caller can abandon the current unit of work and continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResilienceError::NoMem(_) | ResilienceError::NoSpace(_) | ResilienceError::Upstream(_)
        )
    }
}

impl From<std::collections::TryReserveError> for ResilienceError {
    fn from(err: std::collections::TryReserveError) -> Self {
        ResilienceError::NoMem(err.to_string())
    }
}
