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

use crate::message::TelnetMessage;
use crate::parser::parse_message;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// [`tokio_util::codec`] adapter over the resumable message parser.
///
/// The codec itself is stateless; everything the parser needs lives in the
/// read buffer, which also makes the buffer's unconsumed remainder directly
/// snapshottable by the session layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TelnetCodec;

impl TelnetCodec {
    /// Creates the codec.
    pub fn new() -> TelnetCodec {
        TelnetCodec
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetMessage;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetMessage>, Self::Error> {
        // Incomplete frames are simply "not yet"; decoding cannot fail.
        Ok(parse_message(src))
    }
}

impl Encoder<TelnetMessage> for TelnetCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: TelnetMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts;
    use crate::message::NegotiationVerb;
    use bytes::Bytes;

    #[test]
    fn decode_matches_parser() {
        let mut codec = TelnetCodec::new();
        let mut src = BytesMut::from(&b"hi"[..]);
        let decoded = codec.decode(&mut src).unwrap();
        assert_eq!(decoded, Some(TelnetMessage::AppData(Bytes::from_static(b"hi"))));
        assert_eq!(codec.decode(&mut src).unwrap(), None);
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = TelnetCodec::new();
        let msg = TelnetMessage::negotiation(NegotiationVerb::Will, consts::option::GMCP);
        let mut wire = BytesMut::new();
        codec.encode(msg.clone(), &mut wire).unwrap();
        assert_eq!(codec.decode(&mut wire).unwrap(), Some(msg));
    }
}
