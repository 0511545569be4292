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

//! Error types for the service layer.

use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for service operations.
pub type NetResult<T> = std::result::Result<T, NetError>;

/// Service layer error taxonomy.
///
/// Per-connection I/O failures never surface here; they end the affected
/// connection and are reported as `Disconnected` events instead.
#[derive(Debug, Error)]
pub enum NetError {
    /// I/O error from the runtime or a listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A listener could not be created for this address.
    #[error("could not bind listener address {addr}")]
    Bind {
        /// The address that failed to bind.
        addr: String,
    },

    /// A listener is already registered for this port.
    #[error("port {0} is already registered")]
    PortInUse(u16),

    /// No live connection has this id.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// The manager has no running executor.
    #[error("manager is not running")]
    NotRunning,

    /// The manager's executor is already running.
    #[error("manager is already running")]
    AlreadyRunning,

    /// A copyover document could not be applied.
    #[error("copyover recovery failed: {0}")]
    Recovery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = NetError::ConnectionNotFound(ConnectionId::new("telnet_missing000"));
        assert_eq!(err.to_string(), "connection telnet_missing000 not found");
        assert_eq!(NetError::PortInUse(4000).to_string(), "port 4000 is already registered");
    }
}
