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

//! Netline multi-client TCP message server
//!
//! The server accepts TCP connections, exchanges newline-delimited JSON
//! messages with each peer, and surfaces all network activity as an ordered
//! event stream consumed through [`Server::poll_event`] (non-blocking) or
//! [`Server::wait_event`] (blocking).
//!
//! # Architecture
//!
//! Every component instance runs as one independent tokio task and
//! communicates exclusively over channels:
//!
//! ```text
//! Server (facade)
//!     ↓ commands                 ↑ events
//! EventBroker ←──────────────── ConnectionSession (one per client)
//!     ↑ registrations                ↑ spawned by
//! ConnectionAcceptor ──────────────┘
//! ```
//!
//! The acceptor owns the listening socket, each session owns its client
//! socket, and the broker owns the client registry and event queue. No
//! state is shared between tasks.
//!
//! # Example
//!
//! ```no_run
//! use netline_message::Message;
//! use netline_server::{Server, ServerConfig, ServerEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::start(ServerConfig::default().with_port(7700)).await?;
//!     println!("listening on port {}", server.listen_port());
//!
//!     loop {
//!         match server.wait_event().await {
//!             ServerEvent::NewClient(id) => println!("{} connected", id),
//!             ServerEvent::NewMessage(id, msg) => server.send_to_client(id, msg),
//!             ServerEvent::ClientDisconnected(id) => {
//!                 println!("{} left", id);
//!                 break;
//!             }
//!             ServerEvent::NoNewEvents => {}
//!         }
//!     }
//!
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

mod acceptor;
mod broker;
mod config;
mod error;
mod port;
mod server;
mod session;
mod types;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use port::find_available_port;
pub use server::Server;
pub use session::SessionHandle;
pub use types::{ClientId, ServerEvent};
