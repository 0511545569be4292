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

//! A single client connection.
//!
//! Every connection is driven by exactly one spawned task that owns the
//! socket: reads, parsing, option dispatch, and writes all happen there, so
//! per-connection state never sees concurrent protocol activity. The
//! [`Connection`] handle is the shared view: the embedder uses it to send
//! output and drain parsed messages from any thread.

use crate::config::NetConfig;
use crate::types::{ConnectionEvent, ConnectionEventKind, ConnectionId, GameMsg, TextMode};
use crate::utility::{Shutdown, lock};
use bytes::{BufMut, BytesMut};
use futures::StreamExt;
use mudlink_telnetcodec::{
    ClientDetails, GmcpMessage, OptionPerspective, OptionTable, ServerStatus, TelnetCodec,
    TelnetMessage, consts,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Notify, mpsc};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, trace, warn};

/// Protocol-side mutable state: the option table plus the command scratch
/// that accumulates application data between newlines. The scratch holds
/// raw bytes; text decoding happens only when a completed line leaves it.
pub(crate) struct ProtocolState {
    pub(crate) options: OptionTable,
    pub(crate) app_data: BytesMut,
}

struct ConnectionShared {
    id: ConnectionId,
    details: Mutex<ClientDetails>,
    protocol: Mutex<ProtocolState>,
    outbound: Mutex<BytesMut>,
    write_wake: Notify,
    messages_tx: mpsc::Sender<GameMsg>,
    messages_rx: Mutex<mpsc::Receiver<GameMsg>>,
    overflowed: AtomicBool,
    active: AtomicBool,
    closing: AtomicBool,
    /// Unconsumed inbound bytes, captured at handoff and replayed on
    /// recovery. Empty while the connection is being driven.
    in_rest: Mutex<BytesMut>,
}

/// Shared handle to a live connection.
///
/// Clones are cheap and all refer to the same connection. The socket itself
/// is owned by the connection's driver task, not the handle.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<ConnectionShared>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, details: ClientDetails, config: &NetConfig) -> Connection {
        Connection::restore(
            id,
            details,
            OptionTable::new(),
            BytesMut::new(),
            BytesMut::new(),
            BytesMut::new(),
            config,
        )
    }

    pub(crate) fn restore(
        id: ConnectionId,
        details: ClientDetails,
        options: OptionTable,
        app_data: BytesMut,
        in_rest: BytesMut,
        out_pending: BytesMut,
        config: &NetConfig,
    ) -> Connection {
        let (messages_tx, messages_rx) = mpsc::channel(config.message_capacity.max(1));
        Connection {
            shared: Arc::new(ConnectionShared {
                id,
                details: Mutex::new(details),
                protocol: Mutex::new(ProtocolState { options, app_data }),
                outbound: Mutex::new(out_pending),
                write_wake: Notify::new(),
                messages_tx,
                messages_rx: Mutex::new(messages_rx),
                overflowed: AtomicBool::new(false),
                active: AtomicBool::new(false),
                closing: AtomicBool::new(false),
                in_rest: Mutex::new(in_rest),
            }),
        }
    }

    /// The connection's id.
    pub fn id(&self) -> ConnectionId {
        self.shared.id.clone()
    }

    /// A snapshot of the negotiated client capabilities.
    pub fn details(&self) -> ClientDetails {
        lock(&self.shared.details).clone()
    }

    /// Whether the connection has settled and is still alive.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Whether the inbound message ring has dropped messages.
    pub fn overflowed(&self) -> bool {
        self.shared.overflowed.load(Ordering::Acquire)
    }

    /// Takes the next parsed message, if one is waiting. Intended to be
    /// polled from a single consumer thread.
    pub fn try_next_message(&self) -> Option<GameMsg> {
        lock(&self.shared.messages_rx).try_recv().ok()
    }

    /// Negotiation state `(local, remote)` for one option code, if the
    /// option is in the catalog.
    pub fn option_state(&self, code: u8) -> Option<(OptionPerspective, OptionPerspective)> {
        let protocol = lock(&self.shared.protocol);
        protocol
            .options
            .get(code)
            .map(|option| (option.local, option.remote))
    }

    /// Queues raw bytes for transmission and wakes the writer.
    pub fn send_bytes(&self, bytes: &[u8]) {
        {
            let mut outbound = lock(&self.shared.outbound);
            outbound.extend_from_slice(bytes);
        }
        self.shared.write_wake.notify_one();
    }

    /// Queues text for transmission with newline normalization: `\n`
    /// becomes `\r\n`, bare `\r` is dropped. `Line` guarantees a trailing
    /// break; `Prompt` appends `IAC EOR` or `IAC GA` per negotiation.
    pub fn send_text(&self, text: &str, mode: TextMode) {
        let mut out = Vec::with_capacity(text.len() + 2);
        for byte in text.bytes() {
            match byte {
                b'\n' => out.extend_from_slice(b"\r\n"),
                b'\r' => {}
                other => out.push(other),
            }
        }
        match mode {
            TextMode::Text => {}
            TextMode::Line => {
                if !text.ends_with('\n') {
                    out.extend_from_slice(b"\r\n");
                }
            }
            TextMode::Prompt => {
                if lock(&self.shared.details).telopt_eor {
                    out.extend_from_slice(&[consts::IAC, consts::EOR]);
                } else {
                    out.extend_from_slice(&[consts::IAC, consts::GA]);
                }
            }
        }
        self.send_bytes(&out);
    }

    /// Queues a line of text, adding the line break if needed.
    pub fn send_line(&self, text: &str) {
        self.send_text(text, TextMode::Line);
    }

    /// Queues a prompt, terminated per the negotiated convention.
    pub fn send_prompt(&self, text: &str) {
        self.send_text(text, TextMode::Prompt);
    }

    /// Queues a GMCP message if the peer negotiated GMCP; otherwise the
    /// message is discarded.
    pub fn send_gmcp(&self, message: &GmcpMessage) {
        if !lock(&self.shared.details).gmcp {
            debug!(conn = %self.shared.id, package = %message.package, "peer has no GMCP, dropping");
            return;
        }
        let frame = TelnetMessage::subnegotiation(consts::option::GMCP, message.encode());
        self.send_bytes(&frame.to_bytes());
    }

    /// Queues server status data if the peer negotiated MSSP; otherwise it
    /// is discarded.
    pub fn send_mssp(&self, status: &ServerStatus) {
        if !lock(&self.shared.details).mssp {
            debug!(conn = %self.shared.id, "peer has no MSSP, dropping status");
            return;
        }
        let frame = TelnetMessage::subnegotiation(consts::option::MSSP, status.encode());
        self.send_bytes(&frame.to_bytes());
    }

    /// Asks the driver task to close this connection.
    pub(crate) fn request_close(&self) {
        self.shared.closing.store(true, Ordering::Release);
        self.shared.write_wake.notify_one();
    }

    /// Copies the protocol state for the copyover document.
    pub(crate) fn snapshot_protocol(&self) -> (OptionTable, String) {
        let protocol = lock(&self.shared.protocol);
        (
            protocol.options.clone(),
            String::from_utf8_lossy(&protocol.app_data).into_owned(),
        )
    }

    /// Copies the buffered bytes for the copyover document: unconsumed
    /// inbound first, pending outbound second.
    pub(crate) fn snapshot_buffers(&self) -> (BytesMut, BytesMut) {
        let in_rest = lock(&self.shared.in_rest).clone();
        let outbound = lock(&self.shared.outbound).clone();
        (in_rest, outbound)
    }

    /// Dispatches one parsed message: application data feeds the command
    /// scratch, negotiations and subnegotiations go to the option machine.
    /// Replies are queued on the outbound buffer.
    pub(crate) fn handle_message(&self, msg: TelnetMessage) {
        let mut replies = Vec::new();
        let mut queued = Vec::new();
        {
            let mut details = lock(&self.shared.details);
            let mut protocol = lock(&self.shared.protocol);
            let protocol = &mut *protocol;
            match msg {
                TelnetMessage::AppData(data) => {
                    for &byte in data.iter() {
                        match byte {
                            b'\n' => {
                                // Bytes stay raw in the scratch; decode only
                                // here, where the line becomes a command.
                                let line = protocol.app_data.split();
                                let line = String::from_utf8_lossy(&line).into_owned();
                                trace!(conn = %self.shared.id, command = %line, "received command");
                                queued.push(GameMsg::command(line));
                            }
                            b'\r' => {}
                            other => protocol.app_data.put_u8(other),
                        }
                    }
                }
                TelnetMessage::Command(code) => {
                    trace!(conn = %self.shared.id, code, "ignoring command");
                }
                TelnetMessage::Negotiation { verb, option } => {
                    if let Some(event) = protocol.options.receive_negotiation(
                        verb,
                        option,
                        &mut details,
                        &mut replies,
                    ) {
                        queued.push(GameMsg::from_event(event));
                    }
                }
                TelnetMessage::Subnegotiation { option, payload } => {
                    if let Some(event) = protocol.options.receive_subnegotiation(
                        option,
                        &payload,
                        &mut details,
                        &mut replies,
                    ) {
                        queued.push(GameMsg::from_event(event));
                    }
                }
            }
        }
        for msg in queued {
            self.push_message(msg);
        }
        if !replies.is_empty() {
            let mut wire = BytesMut::new();
            for reply in replies {
                reply.encode(&mut wire);
            }
            self.send_bytes(&wire);
        }
    }

    /// Queues one parsed message for the embedder; drops on overflow.
    fn push_message(&self, msg: GameMsg) {
        if self.shared.messages_tx.try_send(msg).is_err() {
            if !self.shared.overflowed.swap(true, Ordering::AcqRel) {
                warn!(conn = %self.shared.id, "message ring full, dropping input");
            }
        }
    }

    fn set_active(&self, active: bool) {
        self.shared.active.store(active, Ordering::Release);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.shared.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// How a driver task ended.
pub(crate) enum TaskExit {
    /// The peer went away or the connection was closed; the socket is gone.
    Closed,
    /// Shutdown was requested; the socket is handed back for copyover.
    Handoff(std::net::TcpStream),
}

/// Drives one connection until the peer disconnects or shutdown triggers.
///
/// This task is the only place the socket is touched, which serializes all
/// parsing, dispatch, and writing for the connection.
pub(crate) async fn drive(
    conn: Connection,
    stream: TcpStream,
    events: mpsc::Sender<ConnectionEvent>,
    shutdown: Arc<Shutdown>,
    handshake_delay: Duration,
    read_capacity: usize,
    recovered: bool,
) -> TaskExit {
    let id = conn.id();
    let (read_half, mut write_half) = stream.into_split();
    let mut framed = FramedRead::with_capacity(read_half, TelnetCodec::new(), read_capacity.max(64));

    if recovered {
        // Replay bytes that were read but not yet parsed before handoff.
        // Complete frames are dispatched right away; only a partial tail
        // goes back into the read buffer to be finished by the next read.
        let mut rest = lock(&conn.shared.in_rest).split();
        while let Some(msg) = mudlink_telnetcodec::parse_message(&mut rest) {
            conn.handle_message(msg);
        }
        if !rest.is_empty() {
            framed.read_buffer_mut().extend_from_slice(&rest);
        }
        conn.set_active(true);
    } else {
        let mut opening = Vec::new();
        {
            let mut protocol = lock(&conn.shared.protocol);
            protocol.options.start_negotiation(&mut opening);
        }
        let mut wire = BytesMut::new();
        for msg in opening {
            msg.encode(&mut wire);
        }
        conn.send_bytes(&wire);
    }

    // Flush the opening negotiations (or, after recovery, the outbound
    // bytes the previous process never managed to write).
    if let Err(error) = flush_outbound(&conn, &mut write_half).await {
        debug!(conn = %id, %error, "write failed during startup");
        return finish_closed(&conn, &events, id);
    }

    let settle = tokio::time::sleep(handshake_delay);
    tokio::pin!(settle);
    let mut settled = recovered;

    loop {
        tokio::select! {
            frame = framed.next() => match frame {
                Some(Ok(msg)) => {
                    conn.handle_message(msg);
                    if let Err(error) = flush_outbound(&conn, &mut write_half).await {
                        debug!(conn = %id, %error, "write failed");
                        return finish_closed(&conn, &events, id);
                    }
                }
                Some(Err(error)) => {
                    debug!(conn = %id, %error, "read failed");
                    return finish_closed(&conn, &events, id);
                }
                None => {
                    debug!(conn = %id, "peer closed connection");
                    return finish_closed(&conn, &events, id);
                }
            },
            () = &mut settle, if !settled => {
                settled = true;
                conn.set_active(true);
                let event = ConnectionEvent::new(id.clone(), ConnectionEventKind::Connected);
                if events.try_send(event).is_err() {
                    warn!(conn = %id, "event queue full, dropping CONNECTED");
                }
            }
            () = conn.shared.write_wake.notified() => {
                if let Err(error) = flush_outbound(&conn, &mut write_half).await {
                    debug!(conn = %id, %error, "write failed");
                    return finish_closed(&conn, &events, id);
                }
                if conn.shared.closing.load(Ordering::Acquire) {
                    debug!(conn = %id, "closed by the manager");
                    return finish_closed(&conn, &events, id);
                }
            }
            () = shutdown.wait() => {
                // Preserve unconsumed inbound bytes for the handoff
                // document, then give the socket back intact.
                *lock(&conn.shared.in_rest) = framed.read_buffer().clone();
                let read_half = framed.into_inner();
                match read_half.reunite(write_half) {
                    Ok(stream) => match stream.into_std() {
                        Ok(std_stream) => return TaskExit::Handoff(std_stream),
                        Err(error) => {
                            error!(conn = %id, %error, "could not detach socket");
                            return TaskExit::Closed;
                        }
                    },
                    Err(error) => {
                        error!(conn = %id, %error, "could not reunite socket halves");
                        return TaskExit::Closed;
                    }
                }
            }
        }
    }
}

fn finish_closed(
    conn: &Connection,
    events: &mpsc::Sender<ConnectionEvent>,
    id: ConnectionId,
) -> TaskExit {
    conn.set_active(false);
    let event = ConnectionEvent::new(id, ConnectionEventKind::Disconnected);
    if events.try_send(event).is_err() {
        warn!(conn = %conn.shared.id, "event queue full, dropping DISCONNECTED");
    }
    TaskExit::Closed
}

/// Drains the outbound buffer to the socket. Bytes queued while a write is
/// in flight land in the (now empty) buffer and are picked up by the next
/// pass of the loop.
async fn flush_outbound(conn: &Connection, write_half: &mut OwnedWriteHalf) -> std::io::Result<()> {
    loop {
        let chunk = {
            let mut outbound = lock(&conn.shared.outbound);
            if outbound.is_empty() {
                return Ok(());
            }
            outbound.split().freeze()
        };
        write_half.write_all(&chunk).await?;
    }
}
