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

//! Wire-level scenarios exercising the parser and option machine together.

use bytes::BytesMut;
use mudlink_telnetcodec::consts::{self, option};
use mudlink_telnetcodec::{
    ClientDetails, ColorType, OptionEvent, OptionTable, TelnetMessage, parse_message,
};

/// One side of a Telnet conversation: parser plus option machine.
struct Endpoint {
    table: OptionTable,
    details: ClientDetails,
    inbound: BytesMut,
}

impl Endpoint {
    fn new() -> Endpoint {
        Endpoint {
            table: OptionTable::new(),
            details: ClientDetails::default(),
            inbound: BytesMut::new(),
        }
    }

    /// Starts negotiation and returns the opening wire bytes.
    fn start(&mut self) -> BytesMut {
        let mut queued = Vec::new();
        self.table.start_negotiation(&mut queued);
        let mut wire = BytesMut::new();
        for msg in queued {
            msg.encode(&mut wire);
        }
        wire
    }

    /// Feeds raw bytes from the peer; returns reply bytes and events.
    fn feed(&mut self, bytes: &[u8]) -> (BytesMut, Vec<OptionEvent>) {
        self.inbound.extend_from_slice(bytes);
        let mut replies = Vec::new();
        let mut events = Vec::new();
        while let Some(msg) = parse_message(&mut self.inbound) {
            match msg {
                TelnetMessage::Negotiation { verb, option } => {
                    if let Some(event) = self.table.receive_negotiation(
                        verb,
                        option,
                        &mut self.details,
                        &mut replies,
                    ) {
                        events.push(event);
                    }
                }
                TelnetMessage::Subnegotiation { option, payload } => {
                    if let Some(event) = self.table.receive_subnegotiation(
                        option,
                        &payload,
                        &mut self.details,
                        &mut replies,
                    ) {
                        events.push(event);
                    }
                }
                TelnetMessage::AppData(_) | TelnetMessage::Command(_) => {}
            }
        }
        let mut wire = BytesMut::new();
        for msg in replies {
            msg.encode(&mut wire);
        }
        (wire, events)
    }
}

fn subnegotiation_wire(code: u8, payload: &[u8]) -> Vec<u8> {
    TelnetMessage::subnegotiation(code, payload.to_vec())
        .to_bytes()
        .to_vec()
}

fn mtts_answer(text: &str) -> Vec<u8> {
    let mut payload = vec![consts::mtts::IS];
    payload.extend_from_slice(text.as_bytes());
    subnegotiation_wire(option::MTTS, &payload)
}

#[test]
fn opening_burst_offers_and_requests() {
    let mut server = Endpoint::new();
    let wire = server.start();
    // Option codes iterate in order: SGA, MTTS, NAWS, MSDP, MSSP, GMCP.
    let expected = [
        consts::IAC,
        consts::WILL,
        option::SGA,
        consts::IAC,
        consts::DO,
        option::MTTS,
        consts::IAC,
        consts::DO,
        option::NAWS,
        consts::IAC,
        consts::WILL,
        option::MSDP,
        consts::IAC,
        consts::WILL,
        option::MSSP,
        consts::IAC,
        consts::WILL,
        option::GMCP,
    ];
    assert_eq!(wire.as_ref(), expected);
}

#[test]
fn unknown_option_offer_is_refused_without_state() {
    let mut server = Endpoint::new();
    let (wire, events) = server.feed(&[consts::IAC, consts::WILL, 99]);
    assert_eq!(wire.as_ref(), &[consts::IAC, consts::DONT, 99]);
    assert!(events.is_empty());
    assert_eq!(server.details, ClientDetails::default());
}

#[test]
fn split_negotiation_frame_produces_single_reply() {
    // IAC WILL arrives first, the option byte a read later.
    let mut server = Endpoint::new();
    let (wire, _) = server.feed(&[consts::IAC, consts::WILL]);
    assert!(wire.is_empty(), "incomplete frame must not be acted on");
    let (wire, _) = server.feed(&[99]);
    assert_eq!(wire.as_ref(), &[consts::IAC, consts::DONT, 99]);
}

#[test]
fn escaped_iac_reaches_gmcp_payload_intact() {
    let mut server = Endpoint::new();
    server.start();
    server.feed(&[consts::IAC, consts::WILL, option::GMCP]);
    // GMCP is locally offered, so a client DO enables it.
    server.feed(&[consts::IAC, consts::DO, option::GMCP]);
    assert!(server.details.gmcp);

    let payload = br#"Core.Supports.Set ["Char 1"]"#;
    let (_, events) = server.feed(&subnegotiation_wire(option::GMCP, payload));
    match events.as_slice() {
        [OptionEvent::Gmcp(msg)] => assert_eq!(msg.package, "Core.Supports.Set"),
        other => panic!("expected one GMCP event, got {other:?}"),
    }
}

#[test]
fn full_mtts_discovery_over_the_wire() {
    let mut server = Endpoint::new();
    server.start();

    // Client accepts terminal-type discovery; server immediately asks.
    let (wire, _) = server.feed(&[consts::IAC, consts::WILL, option::MTTS]);
    assert_eq!(
        wire.as_ref(),
        &[
            consts::IAC,
            consts::SB,
            option::MTTS,
            consts::mtts::SEND,
            consts::IAC,
            consts::SE,
        ]
    );

    let (wire, _) = server.feed(&mtts_answer("MUDLET 4.0"));
    assert!(!wire.is_empty(), "round 0 re-requests");
    let (wire, _) = server.feed(&mtts_answer("XTERM-256COLOR"));
    assert!(!wire.is_empty(), "round 1 re-requests");
    let (wire, _) = server.feed(&mtts_answer("MTTS 15"));
    assert!(wire.is_empty(), "round 2 ends the dialog");

    assert_eq!(server.details.client_name, "MUDLET");
    assert_eq!(server.details.client_version, "4.0");
    assert_eq!(server.details.color, ColorType::Xterm);
    assert!(server.details.vt100);
    assert!(server.details.utf8);

    let mtts = server.table.get(option::MTTS).unwrap().mtts_state();
    assert_eq!(mtts.count, 3);
    assert_eq!(mtts.last, "MTTS 15");
}

#[test]
fn naws_report_lands_in_details() {
    let mut server = Endpoint::new();
    server.start();
    server.feed(&[consts::IAC, consts::WILL, option::NAWS]);
    assert!(server.details.naws);
    server.feed(&subnegotiation_wire(option::NAWS, &[0x00, 0xA0, 0x00, 0x40]));
    assert_eq!((server.details.width, server.details.height), (160, 64));
}

#[test]
fn late_handshake_answers_still_update_state() {
    let mut server = Endpoint::new();
    server.start();
    assert!(server.table.get(option::GMCP).unwrap().local.negotiating);

    // The peer answers long after the opening burst.
    let (wire, _) = server.feed(&[consts::IAC, consts::DO, option::GMCP]);
    assert!(wire.is_empty(), "solicited answer draws no counter-reply");
    let opt = server.table.get(option::GMCP).unwrap();
    assert!(opt.local.enabled && opt.local.answered && !opt.local.negotiating);
}

#[test]
fn subnegotiation_for_unknown_option_is_dropped() {
    let mut server = Endpoint::new();
    let (wire, events) = server.feed(&subnegotiation_wire(91, b"whatever"));
    assert!(wire.is_empty());
    assert!(events.is_empty());
}
