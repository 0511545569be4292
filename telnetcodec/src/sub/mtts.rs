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

//! Mud Terminal Type Standard capability discovery.
//!
//! MTTS runs over the Terminal-Type option as a three-round dialog. Each
//! round the server sends `IAC SB MTTS SEND IAC SE` and the client answers
//! `IAC SB MTTS IS <text> IAC SE`:
//!
//! - round 0: client name and optional version,
//! - round 1: terminal type with an optional `-EXTRA` suffix,
//! - round 2: `MTTS <bitfield>` of capability flags.
//!
//! A repeated answer ends the dialog early. All color deductions are
//! monotonic upgrades.

use crate::consts;
use crate::details::{ClientDetails, ColorType};
use crate::message::TelnetMessage;
use tracing::debug;

/// Clients known to render 256-color output even when their terminal type
/// answer does not say so.
const XTERM_CLIENTS: [&str; 9] = [
    "ATLANTIS",
    "CMUD",
    "KILDCLIENT",
    "MUDLET",
    "PUTTY",
    "BEIP",
    "POTATO",
    "TINYFUGUE",
    "MUSHCLIENT",
];

/// Capability bits of the round 2 bitfield.
const BIT_ANSI: u32 = 1;
const BIT_VT100: u32 = 2;
const BIT_UTF8: u32 = 4;
const BIT_XTERM256: u32 = 8;
const BIT_MOUSE_TRACKING: u32 = 16;
const BIT_OSC_COLOR_PALETTE: u32 = 32;
const BIT_SCREEN_READER: u32 = 64;
const BIT_PROXY: u32 = 128;
const BIT_TRUECOLOR: u32 = 256;
const BIT_MNES: u32 = 512;
const BIT_MSLP: u32 = 1024;

/// Dialog progress for one connection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MttsState {
    /// Rounds completed so far, 0 through 3.
    pub count: u8,
    /// Uppercased text of the previous answer, for repeat detection.
    pub last: String,
}

/// The request payload asking the client for its next answer.
pub(crate) fn send_request(out: &mut Vec<TelnetMessage>) {
    out.push(TelnetMessage::subnegotiation(
        consts::option::MTTS,
        vec![consts::mtts::SEND],
    ));
}

/// Processes one client answer, advancing the dialog.
pub(crate) fn receive(
    state: &mut MttsState,
    payload: &[u8],
    details: &mut ClientDetails,
    out: &mut Vec<TelnetMessage>,
) {
    // Answers start with IS; anything else is not for us.
    if payload.first() != Some(&consts::mtts::IS) {
        return;
    }
    let text = String::from_utf8_lossy(&payload[1..]).to_ascii_uppercase();
    if text == state.last && !state.last.is_empty() {
        // The client repeated itself: the cycle is over.
        debug!(round = state.count, "terminal type dialog settled");
        return;
    }

    let round = state.count;
    match round {
        0 => receive_client_name(&text, details),
        1 => receive_terminal_type(&text, details),
        2 => receive_capability_bits(&text, details),
        _ => return,
    }
    state.last = text;
    state.count = round + 1;
    // Rounds 0 and 1 each have a follow-up question.
    if round < 2 {
        send_request(out);
    }
}

/// Round 0: `NAME [SP VERSION]`.
fn receive_client_name(text: &str, details: &mut ClientDetails) {
    let mut parts = text.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return;
    }
    details.client_name = name.to_string();
    if let Some(version) = parts.next() {
        details.client_version = version.to_string();
    }
    if XTERM_CLIENTS.contains(&name) {
        details.upgrade_color(ColorType::Xterm);
    }
    // Anything that answers MTTS at all can do basic ANSI.
    details.upgrade_color(ColorType::Standard);
}

/// Round 1: `TYPE[-EXTRA]`.
fn receive_terminal_type(text: &str, details: &mut ClientDetails) {
    let mut parts = text.splitn(2, '-');
    let ttype = parts.next().unwrap_or_default();
    match ttype {
        "ANSI" => details.upgrade_color(ColorType::Standard),
        "VT100" => {
            details.upgrade_color(ColorType::Standard);
            details.vt100 = true;
        }
        "XTERM" => {
            details.upgrade_color(ColorType::Xterm);
            details.vt100 = true;
        }
        _ => {}
    }
    match parts.next() {
        Some("256COLOR") => details.upgrade_color(ColorType::Xterm),
        Some("TRUECOLOR") => details.upgrade_color(ColorType::TrueColor),
        _ => {}
    }
}

/// Round 2: `MTTS <decimal bitfield>`.
fn receive_capability_bits(text: &str, details: &mut ClientDetails) {
    let Some(value) = text.strip_prefix("MTTS ") else {
        return;
    };
    let Ok(bits) = value.trim().parse::<u32>() else {
        return;
    };
    if bits & BIT_ANSI != 0 {
        details.upgrade_color(ColorType::Standard);
    }
    if bits & BIT_VT100 != 0 {
        details.vt100 = true;
    }
    if bits & BIT_UTF8 != 0 {
        details.utf8 = true;
    }
    if bits & BIT_XTERM256 != 0 {
        details.upgrade_color(ColorType::Xterm);
    }
    if bits & BIT_MOUSE_TRACKING != 0 {
        details.mouse_tracking = true;
    }
    if bits & BIT_OSC_COLOR_PALETTE != 0 {
        details.osc_color_palette = true;
    }
    if bits & BIT_SCREEN_READER != 0 {
        details.screen_reader = true;
    }
    if bits & BIT_PROXY != 0 {
        details.proxy = true;
    }
    if bits & BIT_TRUECOLOR != 0 {
        details.upgrade_color(ColorType::TrueColor);
    }
    if bits & BIT_MNES != 0 {
        details.mnes = true;
    }
    if bits & BIT_MSLP != 0 {
        details.mslp = true;
    }
}
