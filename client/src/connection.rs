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

//! Client connection task
//!
//! Owns the socket exclusively and runs the same read/heartbeat/write
//! state machine as a server-side session: inbound lines are decoded (or
//! wrapped as raw text), heartbeat frames are consumed silently, write
//! failures close the connection, and the hub is told exactly once when
//! the connection ends.

use crate::event::{ClientEvent, HubRequest};
use futures_util::{SinkExt, StreamExt};
use netline_message::Message;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};

/// Control messages for the connection task
#[derive(Debug)]
pub(crate) enum ConnectionCommand {
    /// Encode and write a message to the server
    Send(Message),
    /// Close the connection
    Disconnect,
}

/// Connection task managing the single server link
pub(crate) struct Connection {
    framed: Framed<TcpStream, LinesCodec>,
    heartbeat_timeout: Option<Duration>,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    hub_tx: mpsc::UnboundedSender<HubRequest>,
    last_interaction: Instant,
}

impl Connection {
    /// Create a connection task for an established socket
    pub(crate) fn new(
        socket: TcpStream,
        heartbeat_timeout: Option<Duration>,
        hub_tx: mpsc::UnboundedSender<HubRequest>,
    ) -> (Self, mpsc::UnboundedSender<ConnectionCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let connection = Self {
            framed: Framed::new(socket, LinesCodec::new()),
            heartbeat_timeout,
            command_rx,
            hub_tx,
            last_interaction: Instant::now(),
        };

        (connection, command_tx)
    }

    /// Run the connection event loop until the link closes
    pub(crate) async fn run(mut self) {
        let heartbeat_enabled = self.heartbeat_timeout.is_some();
        let period = self.heartbeat_timeout.unwrap_or(Duration::from_secs(3600));
        let mut heartbeat = tokio::time::interval(period);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = self.framed.next() => {
                    match line {
                        Some(Ok(line)) => self.handle_line(line),
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "read error ignored");
                        }
                        None => {
                            tracing::debug!("server closed connection");
                            break;
                        }
                    }
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(message)) => {
                            if self.write_message(&message).await.is_err() {
                                break;
                            }
                            self.last_interaction = Instant::now();
                        }
                        Some(ConnectionCommand::Disconnect) | None => {
                            tracing::debug!("disconnect requested");
                            break;
                        }
                    }
                }

                _ = heartbeat.tick(), if heartbeat_enabled => {
                    if self.heartbeat_due() && self.write_message(&Message::heartbeat()).await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = self
            .hub_tx
            .send(HubRequest::Publish(ClientEvent::ServerDisconnected));
        tracing::debug!("connection closed");
    }

    fn handle_line(&mut self, line: String) {
        self.last_interaction = Instant::now();

        let message = match Message::decode(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable record, wrapping as raw text");
                Message::raw_text(line)
            }
        };

        if message.is_heartbeat() {
            return;
        }

        let _ = self
            .hub_tx
            .send(HubRequest::Publish(ClientEvent::NewServerMessage(message)));
    }

    async fn write_message(&mut self, message: &Message) -> Result<(), ()> {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "unencodable message dropped");
                return Ok(());
            }
        };

        if let Err(e) = self.framed.send(text).await {
            tracing::debug!(error = %e, "write failed, disconnecting");
            return Err(());
        }
        Ok(())
    }

    fn heartbeat_due(&self) -> bool {
        match self.heartbeat_timeout {
            Some(timeout) => self.last_interaction.elapsed() > timeout,
            None => false,
        }
    }
}
