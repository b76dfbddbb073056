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

//! Client-side events and the event hub
//!
//! The hub is the client's counterpart of the server's event broker,
//! reduced to a single peer: an ordered queue of events plus FIFO
//! blocking-wait arbitration, owned by one task and driven purely by
//! messages.

use netline_message::Message;
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};

/// Network activity surfaced by the client facade
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection to the server was established
    ServerConnected,
    /// The connection to the server closed
    ServerDisconnected,
    /// The server sent an application message
    NewServerMessage(Message),
    /// The event queue was empty (poll result only, never queued)
    NoNewEvents,
}

/// Requests processed by the hub task
#[derive(Debug)]
pub(crate) enum HubRequest {
    /// Queue an event for delivery
    Publish(ClientEvent),
    /// Non-blocking poll, answered immediately
    Poll {
        /// Reply destination
        reply: oneshot::Sender<ClientEvent>,
    },
    /// Blocking poll; parked until an event exists
    Wait {
        /// Reply destination
        reply: oneshot::Sender<ClientEvent>,
    },
}

/// The hub task state: event queue and parked waiters
pub(crate) struct EventHub {
    queue: VecDeque<ClientEvent>,
    waiters: VecDeque<oneshot::Sender<ClientEvent>>,
    request_rx: mpsc::UnboundedReceiver<HubRequest>,
}

impl EventHub {
    /// Spawn the hub task and return its request channel
    pub(crate) fn spawn() -> mpsc::UnboundedSender<HubRequest> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let hub = Self {
            queue: VecDeque::new(),
            waiters: VecDeque::new(),
            request_rx,
        };
        tokio::spawn(hub.run());

        request_tx
    }

    async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            match request {
                HubRequest::Publish(event) => self.publish(event),
                HubRequest::Poll { reply } => {
                    let event = self.queue.pop_front().unwrap_or(ClientEvent::NoNewEvents);
                    let _ = reply.send(event);
                }
                HubRequest::Wait { reply } => match self.queue.pop_front() {
                    Some(event) => {
                        let _ = reply.send(event);
                    }
                    None => self.waiters.push_back(reply),
                },
            }
        }
        tracing::debug!("event hub terminated");
    }

    /// Deliver an event to the oldest live waiter, or buffer it
    fn publish(&mut self, mut event: ClientEvent) {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(event) {
                Ok(()) => return,
                Err(returned) => event = returned,
            }
        }
        self.queue.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn poll(hub: &mpsc::UnboundedSender<HubRequest>) -> ClientEvent {
        let (reply, rx) = oneshot::channel();
        hub.send(HubRequest::Poll { reply }).unwrap();
        timeout(Duration::from_secs(1), rx).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_poll_empty_returns_no_new_events() {
        let hub = EventHub::spawn();
        assert_eq!(poll(&hub).await, ClientEvent::NoNewEvents);
    }

    #[tokio::test]
    async fn test_events_delivered_fifo() {
        let hub = EventHub::spawn();
        hub.send(HubRequest::Publish(ClientEvent::ServerConnected))
            .unwrap();
        hub.send(HubRequest::Publish(ClientEvent::ServerDisconnected))
            .unwrap();

        assert_eq!(poll(&hub).await, ClientEvent::ServerConnected);
        assert_eq!(poll(&hub).await, ClientEvent::ServerDisconnected);
        assert_eq!(poll(&hub).await, ClientEvent::NoNewEvents);
    }

    #[tokio::test]
    async fn test_parked_waiter_receives_published_event() {
        let hub = EventHub::spawn();

        let (reply, rx) = oneshot::channel();
        hub.send(HubRequest::Wait { reply }).unwrap();
        hub.send(HubRequest::Publish(ClientEvent::ServerConnected))
            .unwrap();

        let event = timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
        assert_eq!(event, ClientEvent::ServerConnected);
        assert_eq!(poll(&hub).await, ClientEvent::NoNewEvents);
    }
}
