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

//! Netline client facade

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionCommand};
use crate::error::{ClientError, Result};
use crate::event::{ClientEvent, EventHub, HubRequest};
use netline_message::Message;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

/// Ceiling for a non-blocking poll round trip
const POLL_CEILING: Duration = Duration::from_secs(2);

/// Ceiling for a blocking wait (effectively unbounded)
const WAIT_CEILING: Duration = Duration::from_secs(24 * 60 * 60);

/// Netline message client
///
/// One connection to one server. Commands are fire-and-forget; connection
/// loss surfaces as a [`ClientEvent::ServerDisconnected`] event, never as
/// an error from `send` or the poll methods.
pub struct Client {
    hub_tx: mpsc::UnboundedSender<HubRequest>,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl Client {
    /// Connect to a server
    ///
    /// On success a [`ClientEvent::ServerConnected`] event is already
    /// queued for retrieval.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let address = config.address();
        let socket = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| ClientError::ConnectTimeout(address.clone()))??;

        tracing::info!(%address, "connected to server");

        let hub_tx = EventHub::spawn();
        let _ = hub_tx.send(HubRequest::Publish(ClientEvent::ServerConnected));

        let (connection, command_tx) =
            Connection::new(socket, config.effective_heartbeat(), hub_tx.clone());
        tokio::spawn(connection.run());

        Ok(Self { hub_tx, command_tx })
    }

    /// Retrieve the next event without blocking
    ///
    /// Returns [`ClientEvent::NoNewEvents`] when the queue is empty.
    pub async fn poll_event(&self) -> ClientEvent {
        self.request_event(|reply| HubRequest::Poll { reply }, POLL_CEILING)
            .await
    }

    /// Block until an event is available
    pub async fn wait_event(&self) -> ClientEvent {
        self.request_event(|reply| HubRequest::Wait { reply }, WAIT_CEILING)
            .await
    }

    /// Queue a message for delivery to the server
    pub fn send(&self, message: Message) {
        let _ = self.command_tx.send(ConnectionCommand::Send(message));
    }

    /// Close the connection
    ///
    /// A [`ClientEvent::ServerDisconnected`] event follows once the
    /// connection task has torn down.
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Disconnect);
    }

    async fn request_event(
        &self,
        request: impl FnOnce(oneshot::Sender<ClientEvent>) -> HubRequest,
        ceiling: Duration,
    ) -> ClientEvent {
        let (reply, reply_rx) = oneshot::channel();
        if self.hub_tx.send(request(reply)).is_err() {
            return ClientEvent::NoNewEvents;
        }

        match tokio::time::timeout(ceiling, reply_rx).await {
            Ok(Ok(event)) => event,
            _ => ClientEvent::NoNewEvents,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish()
    }
}
