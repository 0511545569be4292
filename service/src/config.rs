//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Service configuration.

use std::time::Duration;

/// Tunables for the listen manager and its connections.
#[derive(Clone, Debug)]
pub struct NetConfig {
    /// Capacity of the manager's lifecycle event queue. Events beyond this
    /// are dropped with a warning.
    pub event_capacity: usize,

    /// Capacity of each connection's inbound game-message ring. Overflow
    /// drops the message and sets the connection's overflow flag.
    pub message_capacity: usize,

    /// Read buffer chunk size per connection.
    pub read_chunk_size: usize,

    /// How long after accept the connection is declared ready, whether or
    /// not option negotiation has finished.
    pub handshake_delay: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            event_capacity: 256,
            message_capacity: 128,
            read_chunk_size: 1024,
            handshake_delay: Duration::from_millis(300),
        }
    }
}

impl NetConfig {
    /// Creates the default configuration.
    pub fn new() -> NetConfig {
        NetConfig::default()
    }

    /// Sets the lifecycle event queue capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the per-connection game-message ring capacity.
    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    /// Sets the per-connection read chunk size.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Sets the handshake settle delay.
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NetConfig::default();
        assert_eq!(config.message_capacity, 128);
        assert_eq!(config.handshake_delay, Duration::from_millis(300));
    }

    #[test]
    fn builders_apply() {
        let config = NetConfig::new()
            .with_event_capacity(16)
            .with_handshake_delay(Duration::from_millis(10));
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.handshake_delay, Duration::from_millis(10));
    }
}
