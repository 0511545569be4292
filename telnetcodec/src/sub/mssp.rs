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

//! Mud Server Status Protocol encoding.
//!
//! MSSP is server-to-client only: once the client accepts `WILL MSSP`, the
//! server pushes its status as a `VAR name VAL value` sequence.

use crate::consts;
use bytes::{BufMut, Bytes, BytesMut};

/// An ordered set of server status variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerStatus(Vec<(String, String)>);

impl ServerStatus {
    /// Creates an empty status set.
    pub fn new() -> ServerStatus {
        ServerStatus::default()
    }

    /// Appends one variable. Duplicate names are allowed; MSSP treats later
    /// values for the same name as additional values.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((name.into(), value.into()));
        self
    }

    /// Number of variables recorded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variables have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The subnegotiation payload for this status set.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        for (name, value) in &self.0 {
            dst.put_u8(consts::mssp::VAR);
            dst.put_slice(name.as_bytes());
            dst.put_u8(consts::mssp::VAL);
            dst.put_slice(value.as_bytes());
        }
        dst.freeze()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServerStatus {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> ServerStatus {
        ServerStatus(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pairs() {
        let mut status = ServerStatus::new();
        status.push("NAME", "Ringworld").push("PLAYERS", "52");
        let payload = status.encode();
        let mut expected = Vec::new();
        expected.push(consts::mssp::VAR);
        expected.extend_from_slice(b"NAME");
        expected.push(consts::mssp::VAL);
        expected.extend_from_slice(b"Ringworld");
        expected.push(consts::mssp::VAR);
        expected.extend_from_slice(b"PLAYERS");
        expected.push(consts::mssp::VAL);
        expected.extend_from_slice(b"52");
        assert_eq!(payload.as_ref(), expected.as_slice());
    }

    #[test]
    fn empty_status_encodes_empty() {
        assert!(ServerStatus::new().encode().is_empty());
    }
}
