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

//! Connection acceptor task
//!
//! Owns the listening socket exclusively. For each accepted connection it
//! allocates the next client ID, registers a session handle with the
//! broker, then spawns the session task. Registration happens before the
//! spawn so the broker observes `NewClient` before anything the new peer
//! sends.
//!
//! Stopping the acceptor closes the listener and prevents further spawns;
//! sessions already running are unaffected and close independently.

use crate::broker::BrokerRequest;
use crate::session::ConnectionSession;
use crate::types::ClientId;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

/// Spawn the accept loop task
///
/// The task runs until `shutdown` is notified, then drops the listener.
pub(crate) fn spawn(
    listener: TcpListener,
    heartbeat_timeout: Option<Duration>,
    broker_tx: mpsc::UnboundedSender<BrokerRequest>,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut next_id: u64 = 1;

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((socket, peer_addr)) => {
                        let id = ClientId::new(next_id);
                        next_id += 1;

                        let (session, handle) = ConnectionSession::new(
                            id,
                            socket,
                            heartbeat_timeout,
                            broker_tx.clone(),
                        );
                        let _ = broker_tx.send(BrokerRequest::NewConnection(id, handle));
                        tokio::spawn(session.run());

                        tracing::info!(%id, %peer_addr, "connection accepted");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");

                        // Back off on errors to avoid a tight loop
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },

                _ = shutdown.notified() => break,
            }
        }

        tracing::info!("accept loop terminated");
    })
}
