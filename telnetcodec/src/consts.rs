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

//! Telnet control codes and option numbers.

/// Null byte.
pub const NUL: u8 = 0;
/// Bell.
pub const BEL: u8 = 7;
/// Line Feed.
pub const LF: u8 = 10;
/// Carriage Return.
pub const CR: u8 = 13;
/// End of Record command, used to terminate prompts when EOR is negotiated.
pub const EOR: u8 = 239;
/// Subnegotiation End.
pub const SE: u8 = 240;
/// No Operation.
pub const NOP: u8 = 241;
/// Go Ahead, the classic prompt terminator.
pub const GA: u8 = 249;
/// Subnegotiation Begin.
pub const SB: u8 = 250;
/// Option negotiation: sender offers to enable an option on its side.
pub const WILL: u8 = 251;
/// Option negotiation: sender refuses or disables an option on its side.
pub const WONT: u8 = 252;
/// Option negotiation: sender asks the peer to enable an option.
pub const DO: u8 = 253;
/// Option negotiation: sender asks the peer to disable an option.
pub const DONT: u8 = 254;
/// Interpret As Command, the in-band escape byte.
pub const IAC: u8 = 255;

/// Negotiable option codes.
pub mod option {
    /// Suppress Go Ahead (RFC 858).
    pub const SGA: u8 = 3;
    /// Mud Terminal Type Standard, carried on the Terminal-Type option.
    pub const MTTS: u8 = 24;
    /// End of Record negotiation (RFC 885).
    pub const TELOPT_EOR: u8 = 25;
    /// Negotiate About Window Size (RFC 1073).
    pub const NAWS: u8 = 31;
    /// Linemode (RFC 1184).
    pub const LINEMODE: u8 = 34;
    /// Mud New-Environ Standard.
    pub const MNES: u8 = 39;
    /// Mud Server Data Protocol.
    pub const MSDP: u8 = 69;
    /// Mud Server Status Protocol.
    pub const MSSP: u8 = 70;
    /// Mud Client Compression Protocol v2.
    pub const MCCP2: u8 = 86;
    /// Mud Client Compression Protocol v3.
    pub const MCCP3: u8 = 87;
    /// Mud eXtension Protocol.
    pub const MXP: u8 = 91;
    /// Generic Mud Communication Protocol.
    pub const GMCP: u8 = 201;
}

/// MTTS subnegotiation command bytes.
pub mod mtts {
    /// Payload prefix on client answers.
    pub const IS: u8 = 0;
    /// Payload sent by the server to request the next answer.
    pub const SEND: u8 = 1;
}

/// MSSP subnegotiation markers.
pub mod mssp {
    /// Precedes a variable name.
    pub const VAR: u8 = 1;
    /// Precedes a variable value.
    pub const VAL: u8 = 2;
}
