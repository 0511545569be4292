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

//! The listen manager.
//!
//! [`ListenManager`] owns the executor, the listening sockets, the live
//! connection registry, and the lifecycle event queue. Listeners are
//! configured first, `run` brings up the I/O worker pool, and the embedder
//! then drains events and per-connection messages from its own thread.
//! `stop` tears everything down; `copyover` tears down while preserving
//! every socket for a successor process.

use crate::config::NetConfig;
use crate::connection::{self, Connection, TaskExit};
use crate::error::{NetError, NetResult};
use crate::listener::{self, AcceptExit};
use crate::snapshot::CopyoverSnapshot;
use crate::types::{ConnectionEvent, ConnectionId};
use crate::utility::{Shutdown, lock, random_suffix};
use dashmap::DashMap;
use mudlink_telnetcodec::ClientDetails;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const ID_PREFIX: &str = "telnet_";
const ID_SUFFIX_LEN: usize = 10;

/// Registry entry: the shared handle plus the driver task.
pub(crate) struct ManagedConnection {
    pub(crate) connection: Connection,
    pub(crate) handle: Mutex<Option<JoinHandle<TaskExit>>>,
}

/// State shared with listener and connection tasks.
pub(crate) struct ManagerInner {
    pub(crate) config: NetConfig,
    pub(crate) connections: DashMap<ConnectionId, ManagedConnection>,
    pub(crate) listeners: Mutex<HashMap<u16, JoinHandle<AcceptExit>>>,
    pub(crate) events_tx: mpsc::Sender<ConnectionEvent>,
    pub(crate) shutdown: Arc<Shutdown>,
    pub(crate) running: AtomicBool,
}

impl ManagerInner {
    /// Generates an id not currently in the registry.
    fn generate_id(&self) -> ConnectionId {
        loop {
            let id = ConnectionId::new(format!("{ID_PREFIX}{}", random_suffix(ID_SUFFIX_LEN)));
            if !self.connections.contains_key(&id) {
                return id;
            }
        }
    }

    /// Installs a freshly accepted connection and starts driving it.
    pub(crate) fn install_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
    ) {
        let id = self.generate_id();
        let mut details = ClientDetails::default();
        details.host_ip = peer.ip().to_string();
        let connection = Connection::new(id.clone(), details, &self.config);
        debug!(conn = %id, %peer, "connection accepted");
        self.spawn_driver(id, connection, stream, false);
    }

    /// Re-installs a connection restored from a copyover document.
    fn install_recovered(self: &Arc<Self>, session: RecoveredSession) {
        match tokio::net::TcpStream::from_std(session.stream) {
            Ok(stream) => {
                let id = session.connection.id();
                debug!(conn = %id, "connection resumed");
                self.spawn_driver(id, session.connection, stream, true);
            }
            Err(error) => error!(%error, "could not adopt recovered connection"),
        }
    }

    fn spawn_driver(
        self: &Arc<Self>,
        id: ConnectionId,
        connection: Connection,
        stream: tokio::net::TcpStream,
        recovered: bool,
    ) {
        self.connections.insert(
            id.clone(),
            ManagedConnection {
                connection: connection.clone(),
                handle: Mutex::new(None),
            },
        );
        let inner = Arc::clone(self);
        let events = self.events_tx.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let delay = self.config.handshake_delay;
        let chunk = self.config.read_chunk_size;
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let exit =
                connection::drive(connection, stream, events, shutdown, delay, chunk, recovered)
                    .await;
            if matches!(exit, TaskExit::Closed) {
                inner.connections.remove(&task_id);
            }
            exit
        });
        if let Some(entry) = self.connections.get(&id) {
            *lock(&entry.handle) = Some(handle);
        }
    }
}

/// A connection parsed out of a copyover document, waiting for `run`.
pub(crate) struct RecoveredSession {
    pub(crate) connection: Connection,
    pub(crate) stream: std::net::TcpStream,
}

/// Owns listeners, connections, the event queue, and the I/O runtime.
pub struct ListenManager {
    inner: Arc<ManagerInner>,
    runtime: Option<Runtime>,
    events_rx: mpsc::Receiver<ConnectionEvent>,
    pending_listeners: HashMap<u16, std::net::TcpListener>,
    pending_recovered: Vec<RecoveredSession>,
    bound_addrs: Vec<SocketAddr>,
}

impl ListenManager {
    /// Creates a manager. Nothing listens until `listen_plain_telnet` and
    /// `run` are called.
    pub fn new(config: NetConfig) -> ListenManager {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
        let inner = Arc::new(ManagerInner {
            config,
            connections: DashMap::new(),
            listeners: Mutex::new(HashMap::new()),
            events_tx,
            shutdown: Arc::new(Shutdown::new()),
            running: AtomicBool::new(false),
        });
        ListenManager {
            inner,
            runtime: None,
            events_rx,
            pending_listeners: HashMap::new(),
            pending_recovered: Vec::new(),
            bound_addrs: Vec::new(),
        }
    }

    /// Binds a plain-Telnet listening socket. Must be called before `run`.
    ///
    /// Returns `false` and logs a diagnostic on an unparseable address, a
    /// port that is already registered, or a bind failure.
    pub fn listen_plain_telnet(&mut self, ip: &str, port: u16) -> bool {
        match self.bind_listener(ip, port) {
            Ok(_) => true,
            Err(error) => {
                error!(ip, port, %error, "could not configure listener");
                false
            }
        }
    }

    fn bind_listener(&mut self, ip: &str, port: u16) -> NetResult<SocketAddr> {
        if self.runtime.is_some() {
            return Err(NetError::AlreadyRunning);
        }
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| NetError::Bind { addr: ip.to_string() })?;
        if port != 0 && self.pending_listeners.contains_key(&port) {
            return Err(NetError::PortInUse(port));
        }
        let listener = std::net::TcpListener::bind(SocketAddr::new(addr, port))?;
        let local = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        self.bound_addrs.push(local);
        self.pending_listeners.insert(local.port(), listener);
        info!(addr = %local, "plain telnet listener configured");
        Ok(local)
    }

    /// Addresses of every configured listener, in configuration order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.bound_addrs
    }

    /// Builds the I/O runtime with `threads` workers and starts all
    /// configured listeners and recovered connections on it. Returns
    /// immediately; the calling thread is then free to drain events.
    pub fn run(&mut self, threads: usize) -> NetResult<()> {
        if self.runtime.is_some() {
            return Err(NetError::AlreadyRunning);
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name("mudlink-io")
            .enable_all()
            .build()?;
        let listeners = std::mem::take(&mut self.pending_listeners);
        let recovered = std::mem::take(&mut self.pending_recovered);
        let inner = Arc::clone(&self.inner);
        runtime.block_on(async move {
            // Recovered sessions first so their ids are registered before
            // any new accepts can collide with them.
            for session in recovered {
                inner.install_recovered(session);
            }
            for (port, std_listener) in listeners {
                match tokio::net::TcpListener::from_std(std_listener) {
                    Ok(tcp_listener) => {
                        let handle = tokio::spawn(listener::accept_loop(
                            tcp_listener,
                            port,
                            Arc::clone(&inner),
                            Arc::clone(&inner.shutdown),
                        ));
                        lock(&inner.listeners).insert(port, handle);
                    }
                    Err(error) => error!(port, %error, "could not adopt listener"),
                }
            }
        });
        self.inner.running.store(true, Ordering::Release);
        self.runtime = Some(runtime);
        info!(threads = threads.max(1), "listen manager running");
        Ok(())
    }

    /// Whether the I/O runtime is up.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the next lifecycle event, or `None`
    /// once the manager is gone. Call from the embedder's thread, never
    /// from inside the I/O runtime.
    pub fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events_rx.blocking_recv()
    }

    /// Takes the next lifecycle event without blocking.
    pub fn try_next_event(&mut self) -> Option<ConnectionEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Looks up a live connection by id.
    pub fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.inner
            .connections
            .get(id)
            .map(|entry| entry.connection.clone())
    }

    /// Ids of every live connection.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.inner
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Evicts one connection; its task closes the socket and reports
    /// `Disconnected`.
    pub fn close_connection(&self, id: &ConnectionId) -> NetResult<()> {
        match self.inner.connections.get(id) {
            Some(entry) => {
                entry.connection.request_close();
                Ok(())
            }
            None => Err(NetError::ConnectionNotFound(id.clone())),
        }
    }

    /// Halts the executor and drops every socket. A manager drives one run;
    /// construct a new one to serve again.
    pub fn stop(&mut self) -> NetResult<()> {
        let runtime = self.runtime.take().ok_or(NetError::NotRunning)?;
        self.inner.shutdown.trigger();
        let inner = Arc::clone(&self.inner);
        runtime.block_on(async move {
            let listener_handles: Vec<(u16, JoinHandle<AcceptExit>)> =
                lock(&inner.listeners).drain().collect();
            for (_port, handle) in listener_handles {
                let _ = handle.await;
            }
            let ids: Vec<ConnectionId> =
                inner.connections.iter().map(|entry| entry.key().clone()).collect();
            for id in ids {
                let handle = inner
                    .connections
                    .get(&id)
                    .and_then(|entry| lock(&entry.handle).take());
                if let Some(handle) = handle {
                    let _ = handle.await;
                }
            }
            inner.connections.clear();
        });
        self.inner.running.store(false, Ordering::Release);
        runtime.shutdown_timeout(Duration::from_secs(5));
        info!("listen manager stopped");
        Ok(())
    }

    /// Halts the executor and returns the complete server state, with every
    /// listening and connection socket preserved as an inherited descriptor
    /// for the successor process.
    #[cfg(unix)]
    pub fn copyover(&mut self) -> NetResult<CopyoverSnapshot> {
        use crate::snapshot;

        let runtime = self.runtime.take().ok_or(NetError::NotRunning)?;
        self.inner.shutdown.trigger();
        let inner = Arc::clone(&self.inner);
        let mut listeners_out = Vec::new();
        let mut connections_out = Vec::new();
        runtime.block_on(async {
            let listener_handles: Vec<(u16, JoinHandle<AcceptExit>)> =
                lock(&inner.listeners).drain().collect();
            for (port, handle) in listener_handles {
                match handle.await {
                    Ok(AcceptExit::Handoff(std_listener)) => {
                        listeners_out.push(snapshot::listener_snapshot(port, std_listener));
                    }
                    Ok(AcceptExit::Closed) => warn!(port, "listener lost during copyover"),
                    Err(error) => error!(port, %error, "listener task failed"),
                }
            }
            let ids: Vec<ConnectionId> =
                inner.connections.iter().map(|entry| entry.key().clone()).collect();
            for id in ids {
                let Some((_, managed)) = inner.connections.remove(&id) else {
                    continue;
                };
                let handle = lock(&managed.handle).take();
                let Some(handle) = handle else { continue };
                match handle.await {
                    Ok(TaskExit::Handoff(stream)) => {
                        connections_out
                            .push(snapshot::connection_snapshot(&managed.connection, stream));
                    }
                    Ok(TaskExit::Closed) => {
                        debug!(conn = %id, "connection ended during copyover");
                    }
                    Err(error) => error!(conn = %id, %error, "connection task failed"),
                }
            }
        });
        self.inner.running.store(false, Ordering::Release);
        runtime.shutdown_timeout(Duration::from_secs(5));
        info!(
            listeners = listeners_out.len(),
            connections = connections_out.len(),
            "copyover snapshot taken"
        );
        Ok(CopyoverSnapshot {
            running: true,
            plain_telnet_listeners: listeners_out,
            connections: connections_out,
        })
    }

    /// Copyover depends on unix descriptor semantics.
    #[cfg(not(unix))]
    pub fn copyover(&mut self) -> NetResult<CopyoverSnapshot> {
        Err(NetError::Recovery(String::from(
            "copyover requires unix descriptor inheritance",
        )))
    }

    /// Rebuilds listeners and connections from a copyover document. Must be
    /// called before `run`; entries with unusable descriptors or corrupt
    /// state are skipped with a diagnostic and the rest proceed.
    #[cfg(unix)]
    pub fn copyover_recover(&mut self, document: CopyoverSnapshot) -> NetResult<()> {
        use crate::snapshot;
        use bytes::BytesMut;
        use std::os::fd::FromRawFd;

        if self.runtime.is_some() {
            return Err(NetError::AlreadyRunning);
        }
        for entry in document.plain_telnet_listeners {
            if entry.socket < 0 {
                error!(port = entry.port, "listener entry has no descriptor");
                continue;
            }
            // Safety: the document transfers ownership of the inherited
            // descriptor; each entry is adopted exactly once.
            let std_listener = unsafe { std::net::TcpListener::from_raw_fd(entry.socket) };
            let local = match std_listener.local_addr() {
                Ok(local) => local,
                Err(error) => {
                    error!(port = entry.port, %error, "listener descriptor unusable");
                    continue;
                }
            };
            if let Err(error) = std_listener.set_nonblocking(true) {
                error!(port = entry.port, %error, "listener descriptor unusable");
                continue;
            }
            if self.pending_listeners.contains_key(&entry.port) {
                error!(port = entry.port, "duplicate listener entry");
                continue;
            }
            self.bound_addrs.push(local);
            self.pending_listeners.insert(entry.port, std_listener);
        }
        for entry in document.connections {
            if entry.socket < 0 {
                error!(conn = %entry.conn_id, "connection entry has no descriptor");
                continue;
            }
            // Safety: as above, ownership comes from the document.
            let stream = unsafe { std::net::TcpStream::from_raw_fd(entry.socket) };
            if let Err(error) = stream.set_nonblocking(true) {
                error!(conn = %entry.conn_id, %error, "connection descriptor unusable");
                continue;
            }
            let in_rest = match snapshot::decode_buffer(&entry.in_buffer) {
                Ok(bytes) => bytes,
                Err(error) => {
                    error!(conn = %entry.conn_id, %error, "skipping connection");
                    continue;
                }
            };
            let out_pending = match snapshot::decode_buffer(&entry.out_buffer) {
                Ok(bytes) => bytes,
                Err(error) => {
                    error!(conn = %entry.conn_id, %error, "skipping connection");
                    continue;
                }
            };
            let options = snapshot::restore_options(&entry.handlers);
            let connection = Connection::restore(
                ConnectionId::new(entry.conn_id),
                entry.details,
                options,
                BytesMut::from(entry.app_data.as_bytes()),
                BytesMut::from(in_rest.as_slice()),
                BytesMut::from(out_pending.as_slice()),
                &self.inner.config,
            );
            self.pending_recovered.push(RecoveredSession { connection, stream });
        }
        info!(
            listeners = self.pending_listeners.len(),
            connections = self.pending_recovered.len(),
            "copyover state recovered"
        );
        Ok(())
    }

    /// Copyover depends on unix descriptor semantics.
    #[cfg(not(unix))]
    pub fn copyover_recover(&mut self, _document: CopyoverSnapshot) -> NetResult<()> {
        Err(NetError::Recovery(String::from(
            "copyover requires unix descriptor inheritance",
        )))
    }
}

impl std::fmt::Debug for ListenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenManager")
            .field("running", &self.is_running())
            .field("listeners", &self.bound_addrs)
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_rejects_bad_address() {
        let mut manager = ListenManager::new(NetConfig::default());
        assert!(!manager.listen_plain_telnet("not-an-ip", 0));
        assert!(manager.local_addrs().is_empty());
    }

    #[test]
    fn listen_rejects_duplicate_port() {
        let mut manager = ListenManager::new(NetConfig::default());
        assert!(manager.listen_plain_telnet("127.0.0.1", 0));
        let port = manager.local_addrs()[0].port();
        assert!(!manager.listen_plain_telnet("127.0.0.1", port));
    }

    #[test]
    fn run_and_stop_lifecycle() {
        let mut manager = ListenManager::new(NetConfig::default());
        assert!(manager.listen_plain_telnet("127.0.0.1", 0));
        assert!(!manager.is_running());
        manager.run(1).expect("run");
        assert!(manager.is_running());
        assert!(matches!(manager.run(1), Err(NetError::AlreadyRunning)));
        manager.stop().expect("stop");
        assert!(!manager.is_running());
        assert!(matches!(manager.stop(), Err(NetError::NotRunning)));
    }

    #[test]
    fn generated_ids_have_prefix_and_length() {
        let manager = ListenManager::new(NetConfig::default());
        let id = manager.inner.generate_id();
        let id = id.as_str();
        assert!(id.starts_with(ID_PREFIX));
        assert_eq!(id.len(), ID_PREFIX.len() + ID_SUFFIX_LEN);
    }
}
