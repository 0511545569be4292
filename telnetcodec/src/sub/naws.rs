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

//! Negotiate About Window Size payloads.
//!
//! The payload is four bytes: columns then rows, both big-endian u16.

use crate::details::ClientDetails;
use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

/// Applies a window-size report to the connection details.
pub(crate) fn receive(payload: &[u8], details: &mut ClientDetails) {
    if payload.len() != 4 {
        trace!(len = payload.len(), "ignoring malformed window size payload");
        return;
    }
    let cols = BigEndian::read_u16(&payload[0..2]);
    let rows = BigEndian::read_u16(&payload[2..4]);
    // A zero dimension means "unknown" per RFC 1073; keep the old value.
    if cols > 0 {
        details.width = cols;
    }
    if rows > 0 {
        details.height = rows;
    }
}
