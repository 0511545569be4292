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

//! # Mudlink Service
//!
//! The connection layer of the mudlink stack: accepting Telnet clients,
//! driving them through the wire codec, and presenting the embedding game
//! as an event stream plus per-connection message queues.
//!
//! # Architecture
//!
//! ```text
//! ListenManager
//!     ├── accept loops (one task per listening socket)
//!     └── connection driver tasks (one task per connection)
//!             └── parse → dispatch → reply / queue GameMsg
//! ```
//!
//! The manager owns the tokio runtime; every socket callback runs on its
//! worker pool. Each connection's reads, parsing, dispatch, and writes are
//! confined to its single driver task, so per-connection state needs no
//! further ordering. The embedder's thread stays outside the pool and
//! drains [`ConnectionEvent`]s and [`GameMsg`]s at its own pace.
//!
//! # Example
//!
//! ```no_run
//! use mudlink_service::{ConnectionEventKind, ListenManager, NetConfig};
//!
//! let mut manager = ListenManager::new(NetConfig::default());
//! assert!(manager.listen_plain_telnet("0.0.0.0", 4000));
//! manager.run(4).expect("runtime starts");
//!
//! while let Some(event) = manager.next_event() {
//!     match event.kind {
//!         ConnectionEventKind::Connected => {
//!             if let Some(conn) = manager.connection(&event.conn_id) {
//!                 conn.send_line("Welcome!");
//!             }
//!         }
//!         ConnectionEventKind::Disconnected => {}
//!         ConnectionEventKind::Timeout => {}
//!     }
//! }
//! ```
//!
//! # Process upgrades
//!
//! `copyover()` halts the runtime and returns a [`CopyoverSnapshot`]: a
//! JSON-compatible document holding every listener and connection, their
//! negotiation state, buffered bytes, and raw socket descriptors. The host
//! writes it to a well-known path, clears `O_CLOEXEC` on the descriptors,
//! and re-execs itself; the successor feeds the document to
//! `copyover_recover()` before `run()` and clients never see a disconnect.
//! Descriptor inheritance is unix-only.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod config;
mod connection;
mod error;
mod listener;
mod manager;
mod snapshot;
mod types;
mod utility;

pub use config::NetConfig;
pub use connection::Connection;
pub use error::{NetError, NetResult};
pub use manager::ListenManager;
pub use snapshot::{ConnectionSnapshot, CopyoverSnapshot, ListenerSnapshot, OptionSnapshot};
pub use types::{ConnectionEvent, ConnectionEventKind, ConnectionId, GameMsg, TextMode};
