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

//! The plain-Telnet accept loop.

use crate::manager::ManagerInner;
use crate::utility::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// How an accept loop ended.
pub(crate) enum AcceptExit {
    /// The listener is gone; nothing to hand off.
    Closed,
    /// Shutdown was requested; the listening socket is handed back intact.
    Handoff(std::net::TcpListener),
}

/// Accepts connections on one listening socket until shutdown.
///
/// Accept completions run one at a time on this task, so installs for a
/// given listener never race each other. An accept error backs off briefly
/// instead of spinning; it does not end the loop.
pub(crate) async fn accept_loop(
    listener: TcpListener,
    port: u16,
    inner: Arc<ManagerInner>,
    shutdown: Arc<Shutdown>,
) -> AcceptExit {
    debug!(port, "listening for plain telnet connections");
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    inner.install_connection(stream, peer);
                }
                Err(error) => {
                    error!(port, %error, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            () = shutdown.wait() => {
                debug!(port, "accept loop stopping");
                return match listener.into_std() {
                    Ok(std_listener) => AcceptExit::Handoff(std_listener),
                    Err(error) => {
                        error!(port, %error, "could not detach listener");
                        AcceptExit::Closed
                    }
                };
            }
        }
    }
}
