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

//! Option negotiation state.
//!
//! Each negotiable option keeps two [`OptionPerspective`] records, one per
//! direction: `local` is what this side offers (driven by DO/DONT from the
//! peer), `remote` is what the peer offers (driven by WILL/WONT). The
//! machine never talks to a socket; replies are pushed onto a caller-owned
//! message list and capability changes land in [`ClientDetails`].

use crate::consts::option;
use crate::details::ClientDetails;
use crate::message::{NegotiationVerb, TelnetMessage};
use crate::sub::gmcp::GmcpMessage;
use crate::sub::mtts::{self, MttsState};
use crate::sub::naws;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Negotiation state of one option in one direction.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionPerspective {
    /// The option is currently in effect for this direction.
    pub enabled: bool,
    /// A verb was sent and no reply has come back yet.
    pub negotiating: bool,
    /// The handshake reached a terminal decision at least once.
    pub answered: bool,
}

/// Application-level outcome of a negotiation or subnegotiation step.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionEvent {
    /// The peer delivered a GMCP message.
    Gmcp(GmcpMessage),
    /// The peer accepted MSSP; the embedder should supply status data.
    MsspRequest,
}

/// State and policy for a single negotiable option.
#[derive(Clone, Debug, PartialEq)]
pub struct TelnetOption {
    code: u8,
    /// What this side offers.
    pub local: OptionPerspective,
    /// What the peer offers.
    pub remote: OptionPerspective,
    mtts: MttsState,
}

impl TelnetOption {
    fn new(code: u8) -> TelnetOption {
        TelnetOption {
            code,
            local: OptionPerspective::default(),
            remote: OptionPerspective::default(),
            mtts: MttsState::default(),
        }
    }

    /// The option code this record tracks.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Offered to the peer with WILL on connection start.
    fn start_will(&self) -> bool {
        matches!(
            self.code,
            option::MSSP | option::SGA | option::MSDP | option::GMCP
        )
    }

    /// Requested from the peer with DO on connection start.
    fn start_do(&self) -> bool {
        matches!(self.code, option::NAWS | option::MTTS)
    }

    /// Accepted when the peer asks us to enable it.
    fn support_local(&self) -> bool {
        matches!(
            self.code,
            option::MSSP | option::SGA | option::MSDP | option::GMCP
        )
    }

    /// Accepted when the peer offers it on their side.
    fn support_remote(&self) -> bool {
        matches!(self.code, option::NAWS | option::MTTS)
    }

    /// Current MTTS dialog progress. Meaningful only for the MTTS option.
    pub fn mtts_state(&self) -> &MttsState {
        &self.mtts
    }

    /// Overwrites both perspectives, used when restoring a saved session.
    pub fn set_state(&mut self, local: OptionPerspective, remote: OptionPerspective) {
        self.local = local;
        self.remote = remote;
    }

    /// Overwrites the MTTS dialog progress, used when restoring a saved
    /// session.
    pub fn set_mtts_state(&mut self, state: MttsState) {
        self.mtts = state;
    }

    fn enable_local(
        &mut self,
        details: &mut ClientDetails,
        _out: &mut Vec<TelnetMessage>,
    ) -> Option<OptionEvent> {
        match self.code {
            option::MSSP => {
                details.mssp = true;
                Some(OptionEvent::MsspRequest)
            }
            option::SGA => {
                details.suppress_ga = true;
                None
            }
            option::MSDP => {
                details.msdp = true;
                None
            }
            option::GMCP => {
                details.gmcp = true;
                None
            }
            _ => None,
        }
    }

    fn enable_remote(&mut self, details: &mut ClientDetails, out: &mut Vec<TelnetMessage>) {
        match self.code {
            option::NAWS => details.naws = true,
            option::MTTS => {
                details.mtts = true;
                // Kick off terminal-type discovery.
                mtts::send_request(out);
            }
            _ => {}
        }
    }

    fn disable_local(&mut self, details: &mut ClientDetails) {
        match self.code {
            option::MSSP => details.mssp = false,
            option::SGA => details.suppress_ga = false,
            option::MSDP => details.msdp = false,
            option::GMCP => details.gmcp = false,
            _ => {}
        }
    }

    fn disable_remote(&mut self, details: &mut ClientDetails) {
        match self.code {
            option::NAWS => details.naws = false,
            option::MTTS => details.mtts = false,
            _ => {}
        }
    }

    fn receive_negotiate(
        &mut self,
        verb: NegotiationVerb,
        details: &mut ClientDetails,
        out: &mut Vec<TelnetMessage>,
    ) -> Option<OptionEvent> {
        match verb {
            NegotiationVerb::Will => {
                if !self.support_remote() {
                    out.push(TelnetMessage::negotiation(NegotiationVerb::Dont, self.code));
                    return None;
                }
                if self.remote.negotiating {
                    self.remote.negotiating = false;
                    if !self.remote.enabled {
                        self.remote.enabled = true;
                        self.enable_remote(details, out);
                        self.remote.answered = true;
                    }
                } else {
                    self.remote.enabled = true;
                    out.push(TelnetMessage::negotiation(NegotiationVerb::Do, self.code));
                    self.enable_remote(details, out);
                    self.remote.answered = true;
                }
                None
            }
            NegotiationVerb::Do => {
                if !self.support_local() {
                    out.push(TelnetMessage::negotiation(NegotiationVerb::Wont, self.code));
                    return None;
                }
                if self.local.negotiating {
                    self.local.negotiating = false;
                    if !self.local.enabled {
                        self.local.enabled = true;
                        let event = self.enable_local(details, out);
                        self.local.answered = true;
                        return event;
                    }
                    None
                } else {
                    self.local.enabled = true;
                    out.push(TelnetMessage::negotiation(NegotiationVerb::Will, self.code));
                    let event = self.enable_local(details, out);
                    self.local.answered = true;
                    event
                }
            }
            NegotiationVerb::Wont => {
                if self.remote.enabled {
                    self.remote.enabled = false;
                    self.disable_remote(details);
                }
                self.remote.negotiating = false;
                self.remote.answered = true;
                None
            }
            NegotiationVerb::Dont => {
                if self.local.enabled {
                    self.local.enabled = false;
                    self.disable_local(details);
                }
                self.local.negotiating = false;
                self.local.answered = true;
                None
            }
        }
    }

    fn receive_subnegotiate(
        &mut self,
        payload: &[u8],
        details: &mut ClientDetails,
        out: &mut Vec<TelnetMessage>,
    ) -> Option<OptionEvent> {
        match self.code {
            option::MTTS => {
                mtts::receive(&mut self.mtts, payload, details, out);
                None
            }
            option::NAWS => {
                naws::receive(payload, details);
                None
            }
            option::GMCP => GmcpMessage::parse(payload).map(OptionEvent::Gmcp),
            _ => {
                trace!(code = self.code, "ignoring subnegotiation payload");
                None
            }
        }
    }
}

/// The per-connection table of negotiable options.
///
/// Options outside the table are rejected: `WILL` draws `DONT`, `DO` draws
/// `WONT`, and `WONT`/`DONT` are accepted silently.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionTable {
    handlers: BTreeMap<u8, TelnetOption>,
}

impl Default for OptionTable {
    fn default() -> Self {
        let mut handlers = BTreeMap::new();
        for code in [
            option::SGA,
            option::MTTS,
            option::NAWS,
            option::MSDP,
            option::MSSP,
            option::GMCP,
        ] {
            handlers.insert(code, TelnetOption::new(code));
        }
        OptionTable { handlers }
    }
}

impl OptionTable {
    /// Builds the table with the standard option catalog.
    pub fn new() -> OptionTable {
        OptionTable::default()
    }

    /// Sends the opening round of negotiations: `WILL` for options offered
    /// locally, `DO` for options requested from the peer. Marks each as
    /// negotiating until the peer answers.
    pub fn start_negotiation(&mut self, out: &mut Vec<TelnetMessage>) {
        for (code, handler) in &mut self.handlers {
            if handler.start_will() {
                handler.local.negotiating = true;
                out.push(TelnetMessage::negotiation(NegotiationVerb::Will, *code));
            }
            if handler.start_do() {
                handler.remote.negotiating = true;
                out.push(TelnetMessage::negotiation(NegotiationVerb::Do, *code));
            }
        }
    }

    /// Routes a received negotiation verb to its option.
    pub fn receive_negotiation(
        &mut self,
        verb: NegotiationVerb,
        code: u8,
        details: &mut ClientDetails,
        out: &mut Vec<TelnetMessage>,
    ) -> Option<OptionEvent> {
        match self.handlers.get_mut(&code) {
            Some(handler) => handler.receive_negotiate(verb, details, out),
            None => {
                match verb {
                    NegotiationVerb::Will => {
                        out.push(TelnetMessage::negotiation(NegotiationVerb::Dont, code));
                    }
                    NegotiationVerb::Do => {
                        out.push(TelnetMessage::negotiation(NegotiationVerb::Wont, code));
                    }
                    NegotiationVerb::Wont | NegotiationVerb::Dont => {}
                }
                None
            }
        }
    }

    /// Routes a received subnegotiation payload to its option. Payloads for
    /// options outside the table are dropped.
    pub fn receive_subnegotiation(
        &mut self,
        code: u8,
        payload: &[u8],
        details: &mut ClientDetails,
        out: &mut Vec<TelnetMessage>,
    ) -> Option<OptionEvent> {
        match self.handlers.get_mut(&code) {
            Some(handler) => handler.receive_subnegotiate(payload, details, out),
            None => {
                trace!(code, "subnegotiation for unknown option");
                None
            }
        }
    }

    /// Looks up one option's state.
    pub fn get(&self, code: u8) -> Option<&TelnetOption> {
        self.handlers.get(&code)
    }

    /// Looks up one option's state mutably, for session restore.
    pub fn get_mut(&mut self, code: u8) -> Option<&mut TelnetOption> {
        self.handlers.get_mut(&code)
    }

    /// Iterates all options in code order.
    pub fn iter(&self) -> impl Iterator<Item = &TelnetOption> {
        self.handlers.values()
    }
}
