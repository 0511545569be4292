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

use crate::consts;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// One of the four Telnet option negotiation verbs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NegotiationVerb {
    /// `IAC WILL <opt>` - sender offers to enable an option on its side.
    Will,
    /// `IAC WONT <opt>` - sender refuses or disables an option on its side.
    Wont,
    /// `IAC DO <opt>` - sender asks the peer to enable an option.
    Do,
    /// `IAC DONT <opt>` - sender asks the peer to disable an option.
    Dont,
}

impl NegotiationVerb {
    /// Maps a wire byte onto a verb, if it is one.
    pub fn from_u8(byte: u8) -> Option<NegotiationVerb> {
        match byte {
            consts::WILL => Some(NegotiationVerb::Will),
            consts::WONT => Some(NegotiationVerb::Wont),
            consts::DO => Some(NegotiationVerb::Do),
            consts::DONT => Some(NegotiationVerb::Dont),
            _ => None,
        }
    }

    /// The wire byte for this verb.
    pub fn to_u8(self) -> u8 {
        match self {
            NegotiationVerb::Will => consts::WILL,
            NegotiationVerb::Wont => consts::WONT,
            NegotiationVerb::Do => consts::DO,
            NegotiationVerb::Dont => consts::DONT,
        }
    }
}

impl fmt::Display for NegotiationVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationVerb::Will => write!(f, "WILL"),
            NegotiationVerb::Wont => write!(f, "WONT"),
            NegotiationVerb::Do => write!(f, "DO"),
            NegotiationVerb::Dont => write!(f, "DONT"),
        }
    }
}

/// A single decoded unit of the Telnet stream.
///
/// The parser in [`crate::parser`] produces exactly one of these per call,
/// and [`TelnetMessage::encode`] is its inverse. Payload bytes are stored
/// unescaped; IAC doubling happens only on the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetMessage {
    /// A run of application data bytes. Never contains an IAC.
    AppData(Bytes),
    /// `IAC <code>` for any code that is not a verb or SB.
    Command(u8),
    /// `IAC <verb> <option>`.
    Negotiation {
        /// The negotiation verb.
        verb: NegotiationVerb,
        /// The option code being negotiated.
        option: u8,
    },
    /// `IAC SB <option> <payload> IAC SE` with the payload unescaped.
    Subnegotiation {
        /// The option code the payload belongs to.
        option: u8,
        /// The unescaped payload bytes.
        payload: Bytes,
    },
}

impl TelnetMessage {
    /// Convenience constructor for a negotiation message.
    pub fn negotiation(verb: NegotiationVerb, option: u8) -> TelnetMessage {
        TelnetMessage::Negotiation { verb, option }
    }

    /// Convenience constructor for a subnegotiation message.
    pub fn subnegotiation(option: u8, payload: impl Into<Bytes>) -> TelnetMessage {
        TelnetMessage::Subnegotiation {
            option,
            payload: payload.into(),
        }
    }

    /// Appends the wire form of this message to `dst`, escaping IAC bytes
    /// in application data and subnegotiation payloads.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            TelnetMessage::AppData(bytes) => {
                dst.reserve(bytes.len());
                for &byte in bytes.iter() {
                    if byte == consts::IAC {
                        dst.put_u8(consts::IAC);
                    }
                    dst.put_u8(byte);
                }
            }
            TelnetMessage::Command(code) => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(*code);
            }
            TelnetMessage::Negotiation { verb, option } => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(verb.to_u8());
                dst.put_u8(*option);
            }
            TelnetMessage::Subnegotiation { option, payload } => {
                dst.reserve(5 + payload.len());
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(*option);
                for &byte in payload.iter() {
                    if byte == consts::IAC {
                        dst.put_u8(consts::IAC);
                    }
                    dst.put_u8(byte);
                }
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
        }
    }

    /// The wire form of this message as a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts;

    #[test]
    fn verb_round_trip() {
        for byte in [consts::WILL, consts::WONT, consts::DO, consts::DONT] {
            let verb = NegotiationVerb::from_u8(byte).unwrap();
            assert_eq!(verb.to_u8(), byte);
        }
        assert_eq!(NegotiationVerb::from_u8(consts::SB), None);
    }

    #[test]
    fn encode_app_data_escapes_iac() {
        let msg = TelnetMessage::AppData(Bytes::from_static(&[b'a', consts::IAC, b'b']));
        assert_eq!(
            msg.to_bytes().as_ref(),
            &[b'a', consts::IAC, consts::IAC, b'b']
        );
    }

    #[test]
    fn encode_negotiation() {
        let msg = TelnetMessage::negotiation(NegotiationVerb::Do, consts::option::MTTS);
        assert_eq!(
            msg.to_bytes().as_ref(),
            &[consts::IAC, consts::DO, consts::option::MTTS]
        );
    }

    #[test]
    fn encode_subnegotiation_escapes_iac() {
        let msg = TelnetMessage::subnegotiation(consts::option::GMCP, vec![0x78, consts::IAC, 0x79]);
        assert_eq!(
            msg.to_bytes().as_ref(),
            &[
                consts::IAC,
                consts::SB,
                consts::option::GMCP,
                0x78,
                consts::IAC,
                consts::IAC,
                0x79,
                consts::IAC,
                consts::SE,
            ]
        );
    }

    #[test]
    fn encode_command() {
        let msg = TelnetMessage::Command(consts::NOP);
        assert_eq!(msg.to_bytes().as_ref(), &[consts::IAC, consts::NOP]);
    }
}
