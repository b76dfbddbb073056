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

//! Per-connection session task
//!
//! A [`ConnectionSession`] owns exclusive read/write access to one accepted
//! socket and runs as a single task, so reads, writes, heartbeats, and
//! disconnects are serialized per session. Sessions for different
//! connections run fully independently.
//!
//! Inbound records are decoded as JSON messages; lines that fail to decode
//! are wrapped as raw-text messages rather than dropped. Heartbeat control
//! frames from the peer are consumed silently. Read errors are treated as
//! "no data this tick"; write errors disconnect the session.
//!
//! Whatever closes the session — peer hangup, write failure, or an explicit
//! disconnect command — the broker is notified exactly once on teardown.

use crate::ClientId;
use crate::broker::BrokerRequest;
use futures_util::{SinkExt, StreamExt};
use netline_message::Message;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};

/// Control messages for a session task
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Encode and write a message to the peer
    Send(Message),
    /// Close the connection
    Disconnect,
}

/// Handle used by the broker to command a session
///
/// Commands are fire-and-forget; a handle whose session has already closed
/// silently drops them.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Queue a message for delivery to the peer
    pub fn send(&self, message: Message) {
        let _ = self.command_tx.send(SessionCommand::Send(message));
    }

    /// Ask the session to close its connection
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(SessionCommand::Disconnect);
    }
}

/// Session task managing a single client connection
pub(crate) struct ConnectionSession {
    /// Client ID assigned by the acceptor
    id: ClientId,
    /// Framed transport owning the socket
    framed: Framed<TcpStream, LinesCodec>,
    /// Heartbeat timeout (None disables the heartbeat timer)
    heartbeat_timeout: Option<Duration>,
    /// Command receiver fed through the broker's session handle
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    /// Broker channel for inbound messages and the departure notice
    broker_tx: mpsc::UnboundedSender<BrokerRequest>,
    /// Timestamp of the last successful read or write
    last_interaction: Instant,
}

impl ConnectionSession {
    /// Create a new session for an accepted socket
    ///
    /// Returns the session and the handle the broker uses to command it.
    /// The caller registers the handle with the broker before spawning the
    /// session, so `NewClient` is always observed before any message from
    /// the same connection.
    pub(crate) fn new(
        id: ClientId,
        socket: TcpStream,
        heartbeat_timeout: Option<Duration>,
        broker_tx: mpsc::UnboundedSender<BrokerRequest>,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let session = Self {
            id,
            framed: Framed::new(socket, LinesCodec::new()),
            heartbeat_timeout,
            command_rx,
            broker_tx,
            last_interaction: Instant::now(),
        };

        (session, SessionHandle { command_tx })
    }

    /// Run the session event loop until the connection closes
    pub(crate) async fn run(mut self) {
        tracing::debug!(id = %self.id, "session started");

        // A disabled heartbeat still needs a timer for the select arm; the
        // guard below keeps it from ever firing a write.
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
                            // Transient read faults are not fatal; the
                            // heartbeat path reaps truly dead peers.
                            tracing::debug!(id = %self.id, error = %e, "read error ignored");
                        }
                        None => {
                            tracing::debug!(id = %self.id, "peer closed connection");
                            break;
                        }
                    }
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Send(message)) => {
                            if self.write_message(&message).await.is_err() {
                                break;
                            }
                            self.last_interaction = Instant::now();
                        }
                        Some(SessionCommand::Disconnect) | None => {
                            tracing::debug!(id = %self.id, "disconnect requested");
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

        // Exactly-once departure notice, regardless of who initiated the
        // close. Dropping the framed transport closes the socket.
        let _ = self.broker_tx.send(BrokerRequest::SessionClosed(self.id));
        tracing::debug!(id = %self.id, "session closed");
    }

    /// Decode one inbound record and forward it to the broker
    fn handle_line(&mut self, line: String) {
        self.last_interaction = Instant::now();

        let message = match Message::decode(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(id = %self.id, error = %e, "undecodable record, wrapping as raw text");
                Message::raw_text(line)
            }
        };

        if message.is_heartbeat() {
            return;
        }

        let _ = self
            .broker_tx
            .send(BrokerRequest::Inbound(self.id, message));
    }

    /// Encode and write one message, newline-terminated and flushed
    async fn write_message(&mut self, message: &Message) -> Result<(), ()> {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "unencodable message dropped");
                return Ok(());
            }
        };

        if let Err(e) = self.framed.send(text).await {
            tracing::debug!(id = %self.id, error = %e, "write failed, disconnecting");
            return Err(());
        }
        Ok(())
    }

    /// Check whether the peer has been quiet past the heartbeat timeout
    fn heartbeat_due(&self) -> bool {
        match self.heartbeat_timeout {
            Some(timeout) => self.last_interaction.elapsed() > timeout,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    async fn test_socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let connect = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (server, _) = listener.accept().await.unwrap();
        let client = connect.await.unwrap();

        (server, client)
    }

    fn spawn_session(
        server: TcpStream,
        heartbeat: Option<Duration>,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<BrokerRequest>,
        ClientId,
    ) {
        let id = ClientId::new(1);
        let (broker_tx, broker_rx) = mpsc::unbounded_channel();
        let (session, handle) = ConnectionSession::new(id, server, heartbeat, broker_tx);
        tokio::spawn(session.run());
        (handle, broker_rx, id)
    }

    #[tokio::test]
    async fn test_inbound_line_reaches_broker() {
        let (server, mut client) = test_socket_pair().await;
        let (_handle, mut broker_rx, id) = spawn_session(server, None);

        client.write_all(b"{\"msg\":\"hi\"}\n").await.unwrap();

        let request = timeout(Duration::from_secs(1), broker_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match request {
            BrokerRequest::Inbound(from, message) => {
                assert_eq!(from, id);
                assert_eq!(message.get_str("msg"), Some("hi"));
            }
            other => panic!("expected Inbound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_line_becomes_raw_text() {
        let (server, mut client) = test_socket_pair().await;
        let (_handle, mut broker_rx, _id) = spawn_session(server, None);

        client.write_all(b"not json\n").await.unwrap();

        let request = timeout(Duration::from_secs(1), broker_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match request {
            BrokerRequest::Inbound(_, message) => {
                assert_eq!(
                    message.get_str(netline_message::RAW_TEXT_KEY),
                    Some("not json")
                );
            }
            other => panic!("expected Inbound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_heartbeat_from_peer_is_discarded() {
        let (server, mut client) = test_socket_pair().await;
        let (handle, mut broker_rx, id) = spawn_session(server, None);

        let frame = Message::heartbeat().encode().unwrap();
        client.write_all(format!("{}\n", frame).as_bytes()).await.unwrap();
        client.write_all(b"{\"after\":1}\n").await.unwrap();

        // The first broker request must already be the application message.
        let request = timeout(Duration::from_secs(1), broker_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match request {
            BrokerRequest::Inbound(from, message) => {
                assert_eq!(from, id);
                assert!(message.contains_key("after"));
            }
            other => panic!("expected Inbound, got {:?}", other),
        }

        drop(handle);
    }

    #[tokio::test]
    async fn test_send_command_writes_newline_terminated_json() {
        let (server, client) = test_socket_pair().await;
        let (handle, _broker_rx, _id) = spawn_session(server, None);

        handle.send(Message::new().with("greeting", "hello"));

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        timeout(Duration::from_secs(1), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();

        assert!(line.ends_with('\n'));
        let message = Message::decode(line.trim_end()).unwrap();
        assert_eq!(message.get_str("greeting"), Some("hello"));
    }

    #[tokio::test]
    async fn test_disconnect_notifies_broker_once() {
        let (server, _client) = test_socket_pair().await;
        let (handle, mut broker_rx, id) = spawn_session(server, None);

        handle.disconnect();

        let request = timeout(Duration::from_secs(1), broker_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(request, BrokerRequest::SessionClosed(closed) if closed == id));

        // Channel closes without any further notice.
        assert!(
            timeout(Duration::from_millis(200), broker_rx.recv())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_peer_hangup_notifies_broker() {
        let (server, client) = test_socket_pair().await;
        let (_handle, mut broker_rx, id) = spawn_session(server, None);

        drop(client);

        let request = timeout(Duration::from_secs(1), broker_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(request, BrokerRequest::SessionClosed(closed) if closed == id));
    }

    #[tokio::test]
    async fn test_idle_peer_receives_heartbeat_frame() {
        let (server, client) = test_socket_pair().await;
        let (_handle, _broker_rx, _id) =
            spawn_session(server, Some(Duration::from_millis(100)));

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        timeout(Duration::from_secs(1), reader.read_line(&mut line))
            .await
            .expect("heartbeat should arrive within the timeout window")
            .unwrap();

        let message = Message::decode(line.trim_end()).unwrap();
        assert!(message.is_heartbeat());
    }
}
