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

//! The copyover document.
//!
//! A [`CopyoverSnapshot`] is the complete serializable state of a running
//! manager: listening sockets, live connections, their negotiation state,
//! and both byte buffers. Socket entries are raw OS descriptors, so the
//! document is only meaningful inside the process that produced it or one
//! that inherited its descriptors across `exec`. Everything else is a plain
//! JSON-compatible tree; buffers use RFC 4648 base64 with `=` padding.

use crate::error::{NetError, NetResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use mudlink_telnetcodec::{ClientDetails, MttsState, OptionPerspective, OptionTable};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[cfg(unix)]
use crate::connection::Connection;

/// Serialized state of one listening socket.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListenerSnapshot {
    /// The port the listener was bound to.
    pub port: u16,
    /// Raw OS descriptor of the listening socket.
    pub socket: i32,
    /// 4 for IPv4, 6 for IPv6.
    pub protocol_type: u8,
}

/// Serialized negotiation state of one option.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionSnapshot {
    /// The option code.
    pub code: u8,
    /// Local-side perspective.
    pub local: OptionPerspective,
    /// Remote-side perspective.
    pub remote: OptionPerspective,
    /// MTTS rounds completed. Zero for options other than MTTS.
    pub mtts_count: u8,
    /// Previous MTTS answer. Empty for options other than MTTS.
    pub mtts_last: String,
}

/// Serialized state of one live connection.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ConnectionSnapshot {
    /// The connection id.
    pub conn_id: String,
    /// Negotiated client capabilities.
    pub details: ClientDetails,
    /// Partial command line accumulated before the handoff.
    pub app_data: String,
    /// Per-option negotiation state.
    pub handlers: Vec<OptionSnapshot>,
    /// Base64 of inbound bytes read but not yet parsed.
    pub in_buffer: String,
    /// Base64 of outbound bytes not yet written.
    pub out_buffer: String,
    /// Raw OS descriptor of the connection socket.
    pub socket: i32,
    /// 4 for IPv4, 6 for IPv6.
    pub protocol: u8,
}

/// The complete copyover document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CopyoverSnapshot {
    /// Whether the manager was running when the snapshot was taken.
    pub running: bool,
    /// All plain-Telnet listening sockets.
    #[serde(rename = "plainTelnetListeners")]
    pub plain_telnet_listeners: Vec<ListenerSnapshot>,
    /// All live connections.
    pub connections: Vec<ConnectionSnapshot>,
}

impl CopyoverSnapshot {
    /// The document as a JSON value, ready for the host to write to disk.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Parses a document the host read from disk.
    pub fn from_json(value: serde_json::Value) -> NetResult<CopyoverSnapshot> {
        serde_json::from_value(value).map_err(|error| NetError::Recovery(error.to_string()))
    }
}

/// Serializes an option table.
pub(crate) fn option_snapshots(table: &OptionTable) -> Vec<OptionSnapshot> {
    table
        .iter()
        .map(|option| {
            let mtts = option.mtts_state();
            OptionSnapshot {
                code: option.code(),
                local: option.local,
                remote: option.remote,
                mtts_count: mtts.count,
                mtts_last: mtts.last.clone(),
            }
        })
        .collect()
}

/// Rebuilds an option table from a document. Codes outside the catalog are
/// skipped with a diagnostic; missing codes keep their defaults.
pub(crate) fn restore_options(handlers: &[OptionSnapshot]) -> OptionTable {
    let mut table = OptionTable::new();
    for snapshot in handlers {
        match table.get_mut(snapshot.code) {
            Some(option) => {
                option.set_state(snapshot.local, snapshot.remote);
                option.set_mtts_state(MttsState {
                    count: snapshot.mtts_count,
                    last: snapshot.mtts_last.clone(),
                });
            }
            None => warn!(code = snapshot.code, "unknown option in copyover document"),
        }
    }
    table
}

/// Encodes buffered bytes for the document.
pub(crate) fn encode_buffer(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decodes buffered bytes from the document.
pub(crate) fn decode_buffer(text: &str) -> NetResult<Vec<u8>> {
    BASE64
        .decode(text)
        .map_err(|error| NetError::Recovery(format!("bad buffer encoding: {error}")))
}

/// Captures a listening socket, transferring descriptor ownership into the
/// document.
#[cfg(unix)]
pub(crate) fn listener_snapshot(port: u16, listener: std::net::TcpListener) -> ListenerSnapshot {
    use std::os::fd::IntoRawFd;
    let protocol_type = match listener.local_addr() {
        Ok(addr) if addr.is_ipv6() => 6,
        _ => 4,
    };
    ListenerSnapshot {
        port,
        socket: listener.into_raw_fd(),
        protocol_type,
    }
}

/// Captures a connection, transferring descriptor ownership into the
/// document. The descriptor stays open so it survives a later `exec`.
#[cfg(unix)]
pub(crate) fn connection_snapshot(
    connection: &Connection,
    stream: std::net::TcpStream,
) -> ConnectionSnapshot {
    use std::os::fd::IntoRawFd;
    let protocol = match stream.local_addr() {
        Ok(addr) if addr.is_ipv6() => 6,
        _ => 4,
    };
    let (options, app_data) = connection.snapshot_protocol();
    let (in_rest, outbound) = connection.snapshot_buffers();
    ConnectionSnapshot {
        conn_id: connection.id().as_str().to_string(),
        details: connection.details(),
        app_data,
        handlers: option_snapshots(&options),
        in_buffer: encode_buffer(&in_rest),
        out_buffer: encode_buffer(&outbound),
        socket: stream.into_raw_fd(),
        protocol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mudlink_telnetcodec::consts::option;

    fn sample_snapshot() -> CopyoverSnapshot {
        let mut table = OptionTable::new();
        let mtts = table.get_mut(option::MTTS).expect("catalog option");
        mtts.set_state(
            OptionPerspective::default(),
            OptionPerspective {
                enabled: true,
                negotiating: false,
                answered: true,
            },
        );
        mtts.set_mtts_state(MttsState {
            count: 1,
            last: String::from("MUDLET 4.0"),
        });
        CopyoverSnapshot {
            running: true,
            plain_telnet_listeners: vec![ListenerSnapshot {
                port: 4000,
                socket: 7,
                protocol_type: 4,
            }],
            connections: vec![ConnectionSnapshot {
                conn_id: String::from("telnet_abcdef0123"),
                details: ClientDetails::default(),
                app_data: String::from("loo"),
                handlers: option_snapshots(&table),
                in_buffer: encode_buffer(b"pending-in"),
                out_buffer: encode_buffer(b"pending-out"),
                socket: 8,
                protocol: 4,
            }],
        }
    }

    #[test]
    fn document_round_trips_through_json() {
        let snapshot = sample_snapshot();
        let value = snapshot.to_json().expect("serializable");
        assert!(
            value.get("plainTelnetListeners").is_some(),
            "listener array keeps its documented key"
        );
        let back = CopyoverSnapshot::from_json(value).expect("parseable");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn option_state_round_trips() {
        let snapshot = sample_snapshot();
        let table = restore_options(&snapshot.connections[0].handlers);
        let mtts = table.get(option::MTTS).expect("catalog option");
        assert!(mtts.remote.enabled && mtts.remote.answered);
        assert_eq!(mtts.mtts_state().count, 1);
        assert_eq!(mtts.mtts_state().last, "MUDLET 4.0");
    }

    #[test]
    fn unknown_option_codes_are_skipped() {
        let table = restore_options(&[OptionSnapshot {
            code: 123,
            local: OptionPerspective::default(),
            remote: OptionPerspective::default(),
            mtts_count: 0,
            mtts_last: String::new(),
        }]);
        assert!(table.get(123).is_none());
    }

    #[test]
    fn buffer_encoding_round_trips() {
        let bytes = [0u8, 255, 13, 10, 42];
        let text = encode_buffer(&bytes);
        assert_eq!(decode_buffer(&text).expect("valid"), bytes);
    }

    #[test]
    fn bad_buffer_encoding_is_a_recovery_error() {
        assert!(matches!(
            decode_buffer("not base64!!"),
            Err(NetError::Recovery(_))
        ));
    }
}
