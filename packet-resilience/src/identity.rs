//! RTP participant identity
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


use crate::units::StreamSource;
use tracing::debug;
use uuid::Uuid;

/// Identity of the local participant, owned by its session
#[derive(Debug, Clone)]
pub struct Identity {
    cname: String,
    ssrc: StreamSource,
}

impl Identity {
    /// Generate a fresh identity
    pub fn new() -> Self {
        let identity = Identity {
            cname: Uuid::new_v4().to_string(),
            ssrc: rand::random(),
        };

        debug!(cname = %identity.cname, ssrc = identity.ssrc, "identity: generated");
        identity
    }

    /// Canonical name, unique across all sessions
    pub fn cname(&self) -> &str {
        &self.cname
    }

    /// Synchronization source, unique within a session; may collide
    pub fn ssrc(&self) -> StreamSource {
        self.ssrc
    }

    /// Pick a new SSRC after a collision and return it
    pub fn change_ssrc(&mut self) -> StreamSource {
        let old = self.ssrc;
        while self.ssrc == old {
            self.ssrc = rand::random();
        }

        debug!(old_ssrc = old, new_ssrc = self.ssrc, "identity: changed ssrc");
        self.ssrc
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}
