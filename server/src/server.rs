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

//! Netline server facade
//!
//! The [`Server`] wires the port allocator, connection acceptor, and event
//! broker together and exposes the public poll/wait/send/disconnect
//! surface. Commands are fire-and-forget; polling never returns an error —
//! the only caller-visible failure signal is the absence of events.

use crate::acceptor;
use crate::broker::{BrokerRequest, EventBroker};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::port::find_available_port;
use crate::types::{ClientId, ServerEvent};
use netline_message::Message;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Ceiling for a non-blocking poll round trip
///
/// The broker answers polls immediately, so this bound only matters if the
/// broker task has died; the caller then sees `NoNewEvents` rather than an
/// error.
const POLL_CEILING: Duration = Duration::from_secs(2);

/// Ceiling for a blocking wait (effectively unbounded)
const WAIT_CEILING: Duration = Duration::from_secs(24 * 60 * 60);

/// Netline message server
///
/// # Example
///
/// ```no_run
/// use netline_server::{Server, ServerConfig, ServerEvent};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::start(ServerConfig::default()).await?;
///
///     match server.poll_event().await {
///         ServerEvent::NoNewEvents => println!("quiet"),
///         event => println!("{:?}", event),
///     }
///
///     server.stop().await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    /// Resolved listen port, fixed after construction
    listen_port: u16,
    /// Broker request channel
    broker_tx: mpsc::UnboundedSender<BrokerRequest>,
    /// Acceptor shutdown notification
    shutdown: Arc<Notify>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Accept loop task handle
    accept_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Resolve the listen port, bind, and start accepting connections
    ///
    /// If the requested port is taken, the next available port is used;
    /// the resolved port is reported by [`listen_port`](Self::listen_port).
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let port = find_available_port(config.port).await?;
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let listen_port = listener.local_addr()?.port();

        let broker_tx = EventBroker::spawn();
        let shutdown = Arc::new(Notify::new());
        let accept_handle = acceptor::spawn(
            listener,
            config.effective_heartbeat(),
            broker_tx.clone(),
            shutdown.clone(),
        );

        tracing::info!(port = listen_port, "netline server listening");

        Ok(Self {
            listen_port,
            broker_tx,
            shutdown,
            running: Arc::new(AtomicBool::new(true)),
            accept_handle: tokio::sync::Mutex::new(Some(accept_handle)),
        })
    }

    /// Get the resolved listen port
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Check if the server is still accepting connections
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Retrieve the next event without blocking
    ///
    /// Returns [`ServerEvent::NoNewEvents`] when the queue is empty.
    pub async fn poll_event(&self) -> ServerEvent {
        self.request_event(|reply| BrokerRequest::Poll { reply }, POLL_CEILING)
            .await
    }

    /// Block until an event is available
    ///
    /// Returns the earliest queued event, or parks the caller until one
    /// arrives. Only the caller's task blocks; the broker keeps serving
    /// other requests. Falls back to [`ServerEvent::NoNewEvents`] after an
    /// effectively-unbounded ceiling.
    pub async fn wait_event(&self) -> ServerEvent {
        self.request_event(|reply| BrokerRequest::Wait { reply }, WAIT_CEILING)
            .await
    }

    /// Queue a message for delivery to one client (unknown ids ignored)
    pub fn send_to_client(&self, id: ClientId, message: Message) {
        let _ = self.broker_tx.send(BrokerRequest::SendTo(id, message));
    }

    /// Queue a message for delivery to every connected client
    pub fn broadcast(&self, message: Message) {
        let _ = self.broker_tx.send(BrokerRequest::Broadcast(message));
    }

    /// Ask one client's session to close (unknown ids ignored)
    pub fn disconnect_client(&self, id: ClientId) {
        let _ = self.broker_tx.send(BrokerRequest::Disconnect(id));
    }

    /// Ask every connected session to close
    pub fn disconnect_all(&self) {
        let _ = self.broker_tx.send(BrokerRequest::DisconnectAll);
    }

    /// Stop accepting connections and release the listening socket
    ///
    /// Sessions already established are not force-closed; they end when
    /// their peer disconnects or a disconnect command is issued.
    pub async fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServerError::NotRunning);
        }

        tracing::info!("stopping netline server");
        self.shutdown.notify_waiters();

        if let Some(handle) = self.accept_handle.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        Ok(())
    }

    async fn request_event(
        &self,
        request: impl FnOnce(oneshot::Sender<ServerEvent>) -> BrokerRequest,
        ceiling: Duration,
    ) -> ServerEvent {
        let (reply, reply_rx) = oneshot::channel();
        if self.broker_tx.send(request(reply)).is_err() {
            return ServerEvent::NoNewEvents;
        }

        match tokio::time::timeout(ceiling, reply_rx).await {
            Ok(Ok(event)) => event,
            _ => ServerEvent::NoNewEvents,
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_port", &self.listen_port)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("Server dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown.notify_waiters();
        }
    }
}
