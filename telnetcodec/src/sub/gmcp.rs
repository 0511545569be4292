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

//! Generic Mud Communication Protocol payloads.
//!
//! A GMCP payload is a dotted package name, optionally followed by one
//! space-separated JSON document: `Core.Hello {"client":"Mudlet"}`.

use bytes::Bytes;
use serde_json::Value;

/// One parsed GMCP message.
#[derive(Clone, Debug, PartialEq)]
pub struct GmcpMessage {
    /// Dotted package path, e.g. `Char.Vitals`.
    pub package: String,
    /// The JSON document, when one was attached.
    pub payload: Option<Value>,
}

impl GmcpMessage {
    /// Builds a message with no JSON body.
    pub fn new(package: impl Into<String>) -> GmcpMessage {
        GmcpMessage {
            package: package.into(),
            payload: None,
        }
    }

    /// Builds a message carrying a JSON document.
    pub fn with_payload(package: impl Into<String>, payload: Value) -> GmcpMessage {
        GmcpMessage {
            package: package.into(),
            payload: Some(payload),
        }
    }

    /// Parses a subnegotiation payload. Returns `None` for non-UTF8 input,
    /// an empty package name, or an attached document that is not JSON.
    pub fn parse(payload: &[u8]) -> Option<GmcpMessage> {
        let text = std::str::from_utf8(payload).ok()?;
        let text = text.trim();
        let (package, body) = match text.split_once(' ') {
            Some((package, body)) => (package, body.trim()),
            None => (text, ""),
        };
        if package.is_empty() {
            return None;
        }
        if body.is_empty() {
            return Some(GmcpMessage::new(package));
        }
        let value = serde_json::from_str(body).ok()?;
        Some(GmcpMessage::with_payload(package, value))
    }

    /// The wire payload for this message, ready for subnegotiation framing.
    pub fn encode(&self) -> Bytes {
        let mut text = self.package.clone();
        if let Some(payload) = &self.payload {
            text.push(' ');
            text.push_str(&payload.to_string());
        }
        Bytes::from(text)
    }
}
