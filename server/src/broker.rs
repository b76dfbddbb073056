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

//! Central event broker
//!
//! The broker is the single authority for the client registry, the event
//! queue, and blocking-wait arbitration. It runs as one task and owns all
//! three exclusively; every command from the facade and every event from a
//! session crosses through its channel, which is what makes the event
//! stream globally ordered.
//!
//! Delivery follows the deliver-or-enqueue policy: an event goes straight
//! to the oldest blocked waiter if one exists, otherwise it is buffered in
//! arrival order. Waiters are queued FIFO, so concurrent blocking calls
//! are answered in arrival order and none is silently dropped.

use crate::session::SessionHandle;
use crate::types::{ClientId, ServerEvent};
use netline_message::Message;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, oneshot};

/// Requests processed by the broker task
#[derive(Debug)]
pub(crate) enum BrokerRequest {
    /// Register a freshly accepted session (from the acceptor)
    NewConnection(ClientId, SessionHandle),
    /// An application message read by a session
    Inbound(ClientId, Message),
    /// A session closed; retire its registry entry and emit the event
    SessionClosed(ClientId),
    /// Non-blocking poll, answered immediately
    Poll {
        /// Reply destination
        reply: oneshot::Sender<ServerEvent>,
    },
    /// Blocking poll; parked until an event exists
    Wait {
        /// Reply destination
        reply: oneshot::Sender<ServerEvent>,
    },
    /// Route a message to one client (unknown ids ignored)
    SendTo(ClientId, Message),
    /// Route a message to every registered client
    Broadcast(Message),
    /// Ask one client's session to close (unknown ids ignored)
    Disconnect(ClientId),
    /// Ask every registered session to close
    DisconnectAll,
}

/// The broker task state: registry, event queue, and parked waiters
pub(crate) struct EventBroker {
    /// Live sessions; membership is the source of truth for reachability
    registry: HashMap<ClientId, SessionHandle>,
    /// Events awaiting delivery, in arrival order
    queue: VecDeque<ServerEvent>,
    /// Blocked wait callers, in arrival order
    waiters: VecDeque<oneshot::Sender<ServerEvent>>,
    /// Request inbox
    request_rx: mpsc::UnboundedReceiver<BrokerRequest>,
}

impl EventBroker {
    /// Spawn the broker task and return its request channel
    pub(crate) fn spawn() -> mpsc::UnboundedSender<BrokerRequest> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let broker = Self {
            registry: HashMap::new(),
            queue: VecDeque::new(),
            waiters: VecDeque::new(),
            request_rx,
        };
        tokio::spawn(broker.run());

        request_tx
    }

    /// Process requests until every sender is gone
    async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            self.handle(request);
        }
        tracing::debug!("event broker terminated");
    }

    fn handle(&mut self, request: BrokerRequest) {
        match request {
            BrokerRequest::NewConnection(id, handle) => {
                self.registry.insert(id, handle);
                tracing::info!(%id, clients = self.registry.len(), "client registered");
                self.publish(ServerEvent::NewClient(id));
            }
            BrokerRequest::Inbound(id, message) => {
                self.publish(ServerEvent::NewMessage(id, message));
            }
            BrokerRequest::SessionClosed(id) => {
                // Registry entry and disconnect event retire together; a
                // stray duplicate notice is a no-op.
                if self.registry.remove(&id).is_some() {
                    tracing::info!(%id, clients = self.registry.len(), "client departed");
                    self.publish(ServerEvent::ClientDisconnected(id));
                }
            }
            BrokerRequest::Poll { reply } => {
                let event = self.queue.pop_front().unwrap_or(ServerEvent::NoNewEvents);
                let _ = reply.send(event);
            }
            BrokerRequest::Wait { reply } => {
                match self.queue.pop_front() {
                    Some(event) => {
                        let _ = reply.send(event);
                    }
                    None => self.waiters.push_back(reply),
                }
            }
            BrokerRequest::SendTo(id, message) => {
                match self.registry.get(&id) {
                    Some(handle) => handle.send(message),
                    None => tracing::debug!(%id, "send to unknown client ignored"),
                }
            }
            BrokerRequest::Broadcast(message) => {
                for handle in self.registry.values() {
                    handle.send(message.clone());
                }
            }
            BrokerRequest::Disconnect(id) => {
                match self.registry.get(&id) {
                    Some(handle) => handle.disconnect(),
                    None => tracing::debug!(%id, "disconnect of unknown client ignored"),
                }
            }
            BrokerRequest::DisconnectAll => {
                for handle in self.registry.values() {
                    handle.disconnect();
                }
            }
        }
    }

    /// Deliver an event to the oldest live waiter, or buffer it
    fn publish(&mut self, mut event: ServerEvent) {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(event) {
                Ok(()) => return,
                // Caller gave up on the wait; offer the event to the next.
                Err(returned) => event = returned,
            }
        }
        self.queue.push_back(event);
    }
}
