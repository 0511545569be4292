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

//! Negotiated client capabilities.
//!
//! [`ClientDetails`] is the per-connection record of everything negotiation
//! and MTTS discovery learned about the peer. Only option handlers mutate
//! it; everything else reads snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The transport a connection arrived over.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum TransportKind {
    /// Plain TCP Telnet.
    #[default]
    Telnet,
    /// Telnet over TLS.
    TlsTelnet,
    /// WebSocket framing.
    WebSocket,
}

/// Color depth the client is known to support.
///
/// Ordered so that capability upgrades can be expressed as a simple `max`.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum ColorType {
    /// No color support detected.
    #[default]
    None,
    /// Basic 16-color ANSI.
    Standard,
    /// Xterm 256 color.
    Xterm,
    /// 24-bit true color.
    TrueColor,
}

/// Everything negotiation has learned about the connected client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientDetails {
    /// Transport the client connected over.
    pub transport: TransportKind,
    /// Best color depth seen so far. Upgrades are monotonic.
    pub color: ColorType,
    /// Client program name from MTTS round 0.
    pub client_name: String,
    /// Client program version from MTTS round 0.
    pub client_version: String,
    /// Peer IP address as text.
    pub host_ip: String,
    /// Resolved peer host name, when available.
    pub host_name: String,
    /// Terminal width in columns.
    pub width: u16,
    /// Terminal height in rows.
    pub height: u16,
    /// Client handles UTF-8 output.
    pub utf8: bool,
    /// Client declared itself a screen reader.
    pub screen_reader: bool,
    /// Client is a proxy for another client.
    pub proxy: bool,
    /// Client supports OSC color palette redefinition.
    pub osc_color_palette: bool,
    /// Client is VT100 compatible.
    pub vt100: bool,
    /// Client supports mouse tracking.
    pub mouse_tracking: bool,
    /// NAWS is enabled on the remote side.
    pub naws: bool,
    /// MSDP is enabled.
    pub msdp: bool,
    /// GMCP is enabled.
    pub gmcp: bool,
    /// Client advertised MCCP2. Compression itself is not performed.
    pub mccp2: bool,
    /// Client advertised MCCP3. Compression itself is not performed.
    pub mccp3: bool,
    /// EOR negotiated; prompts end in `IAC EOR` instead of `IAC GA`.
    pub telopt_eor: bool,
    /// MTTS terminal discovery is active.
    pub mtts: bool,
    /// Client supports the Mud New-Environ Standard.
    pub mnes: bool,
    /// Suppress Go Ahead is enabled.
    pub suppress_ga: bool,
    /// Client supports the Mud Server Link Protocol.
    pub mslp: bool,
    /// Linemode negotiated.
    pub linemode: bool,
    /// MSSP is enabled.
    pub mssp: bool,
    /// MXP negotiated.
    pub mxp: bool,
}

impl Default for ClientDetails {
    fn default() -> Self {
        ClientDetails {
            transport: TransportKind::Telnet,
            color: ColorType::None,
            client_name: String::from("UNKNOWN"),
            client_version: String::from("UNKNOWN"),
            host_ip: String::from("UNKNOWN"),
            host_name: String::from("UNKNOWN"),
            width: 78,
            height: 24,
            utf8: false,
            screen_reader: false,
            proxy: false,
            osc_color_palette: false,
            vt100: false,
            mouse_tracking: false,
            naws: false,
            msdp: false,
            gmcp: false,
            mccp2: false,
            mccp3: false,
            telopt_eor: false,
            mtts: false,
            mnes: false,
            suppress_ga: false,
            mslp: false,
            linemode: false,
            mssp: false,
            mxp: false,
        }
    }
}

impl ClientDetails {
    /// Whether the transport itself is encrypted or framed.
    pub fn is_secure(&self) -> bool {
        matches!(
            self.transport,
            TransportKind::TlsTelnet | TransportKind::WebSocket
        )
    }

    /// Whether out-of-band structured messages can reach this client.
    pub fn supports_oob(&self) -> bool {
        if self.transport == TransportKind::WebSocket {
            return true;
        }
        self.gmcp || self.msdp
    }

    /// Raises the color capability to `floor` if it is currently below it.
    /// Never downgrades.
    pub fn upgrade_color(&mut self, floor: ColorType) {
        if self.color < floor {
            self.color = floor;
        }
    }
}

impl fmt::Display for ClientDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:?}, {}x{})",
            self.client_name, self.client_version, self.color, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_upgrade_is_monotonic() {
        let mut details = ClientDetails::default();
        details.upgrade_color(ColorType::Xterm);
        assert_eq!(details.color, ColorType::Xterm);
        details.upgrade_color(ColorType::Standard);
        assert_eq!(details.color, ColorType::Xterm);
        details.upgrade_color(ColorType::TrueColor);
        assert_eq!(details.color, ColorType::TrueColor);
    }

    #[test]
    fn oob_requires_gmcp_or_msdp() {
        let mut details = ClientDetails::default();
        assert!(!details.supports_oob());
        details.gmcp = true;
        assert!(details.supports_oob());
        details.gmcp = false;
        details.msdp = true;
        assert!(details.supports_oob());
    }

    #[test]
    fn plain_telnet_is_not_secure() {
        assert!(!ClientDetails::default().is_secure());
    }
}
