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

//! # Mudlink Telnet Codec
//!
//! The wire layer of the mudlink stack: a resumable Telnet tokenizer, the
//! option negotiation state machine, and the MUD protocol extensions
//! (MTTS, NAWS, GMCP, MSSP) layered on subnegotiation.
//!
//! ## Parsing
//!
//! [`parse_message`] extracts at most one [`TelnetMessage`] from the front
//! of a [`bytes::BytesMut`]. Incomplete input returns `None` and consumes
//! nothing, so the same buffer can simply be re-polled after the next read.
//! All parser state lives in the buffer itself, which is what makes session
//! handoff across a process upgrade possible: the unconsumed bytes are the
//! state.
//!
//! ```
//! use bytes::BytesMut;
//! use mudlink_telnetcodec::{parse_message, TelnetMessage};
//!
//! let mut buf = BytesMut::from(&b"look\xFF\xF1"[..]);
//! assert_eq!(
//!     parse_message(&mut buf),
//!     Some(TelnetMessage::AppData(bytes::Bytes::from_static(b"look")))
//! );
//! assert_eq!(parse_message(&mut buf), Some(TelnetMessage::Command(241)));
//! ```
//!
//! ## Negotiation
//!
//! [`OptionTable`] holds per-option [`OptionPerspective`] pairs and the
//! fixed accept/offer policy. It emits replies into a caller-owned
//! `Vec<TelnetMessage>` and records negotiated capabilities in
//! [`ClientDetails`]; it never touches a socket.
//!
//! ## Framing adapter
//!
//! [`TelnetCodec`] wraps the parser in `tokio_util::codec` `Decoder` /
//! `Encoder` impls for use with `FramedRead`.

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

mod codec;
pub mod consts;
mod details;
mod message;
mod options;
mod parser;
pub mod sub;

pub use self::codec::TelnetCodec;
pub use self::details::{ClientDetails, ColorType, TransportKind};
pub use self::message::{NegotiationVerb, TelnetMessage};
pub use self::options::{OptionEvent, OptionPerspective, OptionTable, TelnetOption};
pub use self::parser::parse_message;
pub use self::sub::gmcp::GmcpMessage;
pub use self::sub::mssp::ServerStatus;
pub use self::sub::mtts::MttsState;
