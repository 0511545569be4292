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
use crate::message::{NegotiationVerb, TelnetMessage};
use bytes::{Buf, BytesMut};

/// Extracts at most one [`TelnetMessage`] from the front of `buf`.
///
/// Returns `None` when the buffer does not yet hold a complete message; in
/// that case nothing is consumed and the caller retries once more bytes
/// arrive. On `Some`, exactly the bytes making up the returned message have
/// been consumed.
///
/// The function carries no state of its own, so a stream can be parsed
/// across arbitrary read boundaries by re-invoking it on the same buffer.
/// Incomplete or odd input is never an error: a lone trailing IAC, a
/// truncated negotiation, or an unterminated subnegotiation all simply
/// yield `None`.
pub fn parse_message(buf: &mut BytesMut) -> Option<TelnetMessage> {
    if buf.is_empty() {
        return None;
    }

    if buf[0] != consts::IAC {
        // Plain data run: everything up to the next IAC, or the whole buffer.
        let end = buf
            .iter()
            .position(|&byte| byte == consts::IAC)
            .unwrap_or(buf.len());
        let data = buf.split_to(end).freeze();
        return Some(TelnetMessage::AppData(data));
    }

    if buf.len() < 2 {
        return None;
    }

    match buf[1] {
        consts::WILL | consts::WONT | consts::DO | consts::DONT => {
            if buf.len() < 3 {
                return None;
            }
            // The match arm guarantees the byte is a verb.
            let verb = match buf[1] {
                consts::WILL => NegotiationVerb::Will,
                consts::WONT => NegotiationVerb::Wont,
                consts::DO => NegotiationVerb::Do,
                _ => NegotiationVerb::Dont,
            };
            let option = buf[2];
            buf.advance(3);
            Some(TelnetMessage::Negotiation { verb, option })
        }
        consts::SB => {
            // IAC SB <opt> ... IAC SE is at least five bytes.
            if buf.len() < 5 {
                return None;
            }
            let option = buf[2];
            let mut payload = Vec::new();
            let mut index = 3;
            while index < buf.len() {
                let byte = buf[index];
                if byte != consts::IAC {
                    payload.push(byte);
                    index += 1;
                    continue;
                }
                // An IAC inside the payload needs its follow-up byte before
                // we can tell an escape from the terminator.
                if index + 1 >= buf.len() {
                    return None;
                }
                match buf[index + 1] {
                    consts::IAC => {
                        payload.push(consts::IAC);
                        index += 2;
                    }
                    consts::SE => {
                        let msg = TelnetMessage::Subnegotiation {
                            option,
                            payload: payload.into(),
                        };
                        buf.advance(index + 2);
                        return Some(msg);
                    }
                    other => {
                        payload.push(consts::IAC);
                        payload.push(other);
                        index += 2;
                    }
                }
            }
            None
        }
        code => {
            buf.advance(2);
            Some(TelnetMessage::Command(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts;
    use bytes::Bytes;

    fn buf(bytes: &[u8]) -> BytesMut {
        BytesMut::from(bytes)
    }

    #[test]
    fn empty_buffer_yields_none() {
        let mut src = BytesMut::new();
        assert_eq!(parse_message(&mut src), None);
    }

    #[test]
    fn plain_data_consumes_up_to_iac() {
        let mut src = buf(&[b'h', b'i', consts::IAC, consts::NOP]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::AppData(Bytes::from_static(b"hi")))
        );
        assert_eq!(src.len(), 2);
    }

    #[test]
    fn plain_data_without_iac_consumes_everything() {
        let mut src = buf(b"hello");
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::AppData(Bytes::from_static(b"hello")))
        );
        assert!(src.is_empty());
    }

    #[test]
    fn lone_iac_waits_for_more() {
        let mut src = buf(&[consts::IAC]);
        assert_eq!(parse_message(&mut src), None);
        assert_eq!(src.len(), 1);
    }

    #[test]
    fn negotiation_needs_three_bytes() {
        let mut src = buf(&[consts::IAC, consts::DO]);
        assert_eq!(parse_message(&mut src), None);
        src.extend_from_slice(&[consts::option::MTTS]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::Negotiation {
                verb: NegotiationVerb::Do,
                option: consts::option::MTTS,
            })
        );
        assert!(src.is_empty());
    }

    #[test]
    fn command_consumes_two_bytes() {
        let mut src = buf(&[consts::IAC, consts::GA, b'x']);
        assert_eq!(parse_message(&mut src), Some(TelnetMessage::Command(consts::GA)));
        assert_eq!(src.len(), 1);
    }

    #[test]
    fn subnegotiation_with_escaped_iac() {
        let mut src = buf(&[
            consts::IAC,
            consts::SB,
            consts::option::GMCP,
            b'x',
            consts::IAC,
            consts::IAC,
            b'y',
            consts::IAC,
            consts::SE,
        ]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::Subnegotiation {
                option: consts::option::GMCP,
                payload: Bytes::from_static(&[0x78, 0xFF, 0x79]),
            })
        );
        assert!(src.is_empty());
    }

    #[test]
    fn unterminated_subnegotiation_waits() {
        let mut src = buf(&[consts::IAC, consts::SB, consts::option::MTTS, b'a', b'b']);
        assert_eq!(parse_message(&mut src), None);
        assert_eq!(src.len(), 5);
        src.extend_from_slice(&[consts::IAC, consts::SE]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::Subnegotiation {
                option: consts::option::MTTS,
                payload: Bytes::from_static(b"ab"),
            })
        );
    }

    #[test]
    fn subnegotiation_trailing_iac_waits() {
        // The final IAC might be an escape or the start of the terminator.
        let mut src = buf(&[consts::IAC, consts::SB, consts::option::GMCP, b'a', consts::IAC]);
        assert_eq!(parse_message(&mut src), None);
        assert_eq!(src.len(), 5);
    }

    #[test]
    fn empty_subnegotiation() {
        let mut src = buf(&[
            consts::IAC,
            consts::SB,
            consts::option::NAWS,
            consts::IAC,
            consts::SE,
        ]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::Subnegotiation {
                option: consts::option::NAWS,
                payload: Bytes::new(),
            })
        );
    }

    #[test]
    fn split_negotiation_produces_one_message() {
        // Frame split across two reads must not produce duplicates.
        let mut src = buf(&[consts::IAC, consts::DO]);
        assert_eq!(parse_message(&mut src), None);
        src.extend_from_slice(&[consts::option::MTTS]);
        let first = parse_message(&mut src);
        assert!(matches!(first, Some(TelnetMessage::Negotiation { .. })));
        assert_eq!(parse_message(&mut src), None);
    }

    #[test]
    fn messages_in_sequence() {
        let mut src = buf(&[
            b'o',
            b'k',
            consts::IAC,
            consts::WILL,
            consts::option::NAWS,
            consts::IAC,
            consts::NOP,
        ]);
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::AppData(Bytes::from_static(b"ok")))
        );
        assert_eq!(
            parse_message(&mut src),
            Some(TelnetMessage::Negotiation {
                verb: NegotiationVerb::Will,
                option: consts::option::NAWS,
            })
        );
        assert_eq!(parse_message(&mut src), Some(TelnetMessage::Command(consts::NOP)));
        assert_eq!(parse_message(&mut src), None);
    }
}
