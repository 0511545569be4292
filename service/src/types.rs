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

//! Core types shared across the service layer.

use mudlink_telnetcodec::{GmcpMessage, OptionEvent};
use std::fmt;

/// Unique identifier for a connection.
///
/// Ids are a transport prefix plus a random suffix (e.g. `telnet_x9Kq3bTz0a`)
/// and are never reused while the connection is live.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wraps an id string.
    pub fn new(id: impl Into<String>) -> ConnectionId {
        ConnectionId(id.into())
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> ConnectionId {
        ConnectionId(id)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> ConnectionId {
        ConnectionId(id.to_string())
    }
}

/// What happened to a connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionEventKind {
    /// The handshake settle timer elapsed; the connection is ready for the
    /// embedder whether or not negotiation completed.
    Connected,
    /// The peer closed the socket or an I/O error ended the connection.
    Disconnected,
    /// Reserved for embedder-level idle handling; the core never emits it.
    Timeout,
}

/// A lifecycle notification delivered on the manager's event queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionEvent {
    /// The connection the event concerns.
    pub conn_id: ConnectionId,
    /// What happened.
    pub kind: ConnectionEventKind,
}

impl ConnectionEvent {
    /// Builds an event.
    pub fn new(conn_id: ConnectionId, kind: ConnectionEventKind) -> ConnectionEvent {
        ConnectionEvent { conn_id, kind }
    }
}

/// How outbound text should be terminated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    /// Send as-is after newline normalization.
    Text,
    /// Guarantee a trailing line break.
    Line,
    /// Terminate with `IAC EOR` or `IAC GA` depending on negotiation.
    Prompt,
}

/// One parsed in-band message, delivered on a connection's message queue.
#[derive(Clone, Debug, PartialEq)]
pub struct GameMsg {
    /// A completed command line, without its terminator.
    pub command: Option<String>,
    /// An out-of-band structured message from the peer.
    pub oob: Option<GmcpMessage>,
    /// The peer accepted MSSP and the embedder should supply status data.
    pub mssp: bool,
}

impl GameMsg {
    /// A plain command line.
    pub fn command(line: impl Into<String>) -> GameMsg {
        GameMsg {
            command: Some(line.into()),
            oob: None,
            mssp: false,
        }
    }

    /// An out-of-band structured message.
    pub fn oob(message: GmcpMessage) -> GameMsg {
        GameMsg {
            command: None,
            oob: Some(message),
            mssp: false,
        }
    }

    /// A request for server status data.
    pub fn mssp_request() -> GameMsg {
        GameMsg {
            command: None,
            oob: None,
            mssp: true,
        }
    }

    pub(crate) fn from_event(event: OptionEvent) -> GameMsg {
        match event {
            OptionEvent::Gmcp(message) => GameMsg::oob(message),
            OptionEvent::MsspRequest => GameMsg::mssp_request(),
        }
    }
}
