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

//! Core types for the Netline server

use netline_message::Message;
use std::fmt;

/// Unique identifier for a client connection (monotonically increasing, never reused)
///
/// Ids are assigned by the acceptor in acceptance order starting at 1. An id
/// is never reassigned, even after its connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Create a new client ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Network activity surfaced by the server facade
///
/// Events are delivered in arrival order across all sessions. Heartbeat
/// control frames are consumed by the session layer and never appear here.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A new client connection was accepted
    NewClient(ClientId),
    /// A client sent an application message
    NewMessage(ClientId, Message),
    /// A client connection closed, whether peer- or server-initiated
    ClientDisconnected(ClientId),
    /// The event queue was empty (poll result only, never queued)
    NoNewEvents,
}

impl ServerEvent {
    /// Get the client ID this event concerns, if any
    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            Self::NewClient(id) | Self::NewMessage(id, _) | Self::ClientDisconnected(id) => {
                Some(*id)
            }
            Self::NoNewEvents => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_ordering() {
        let id1 = ClientId::new(1);
        let id2 = ClientId::new(2);

        assert_eq!(id1.as_u64(), 1);
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId::new(42).to_string(), "client-42");
    }

    #[test]
    fn test_event_client_id() {
        let id = ClientId::new(7);
        assert_eq!(ServerEvent::NewClient(id).client_id(), Some(id));
        assert_eq!(
            ServerEvent::NewMessage(id, Message::new()).client_id(),
            Some(id)
        );
        assert_eq!(ServerEvent::ClientDisconnected(id).client_id(), Some(id));
        assert_eq!(ServerEvent::NoNewEvents.client_id(), None);
    }
}
