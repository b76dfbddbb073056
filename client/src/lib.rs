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

//! Netline single-connection TCP message client
//!
//! The symmetric counterpart of the server facade: one connection to one
//! server, newline-delimited JSON messages, and network activity consumed
//! through [`Client::poll_event`] / [`Client::wait_event`] rather than raw
//! socket calls. Heartbeat frames from the server are consumed silently
//! and never surface as events.
//!
//! # Example
//!
//! ```no_run
//! use netline_client::{Client, ClientConfig, ClientEvent};
//! use netline_message::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect(ClientConfig::new("localhost", 7700)).await?;
//!     client.send(Message::new().with("op", "hello"));
//!
//!     loop {
//!         match client.wait_event().await {
//!             ClientEvent::NewServerMessage(msg) => println!("{}", msg),
//!             ClientEvent::ServerDisconnected => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod event;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use event::ClientEvent;
