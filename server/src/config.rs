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

//! Server configuration
//!
//! # Example
//!
//! ```
//! use netline_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::default()
//!     .with_port(7700)
//!     .with_heartbeat_timeout(Some(Duration::from_millis(200)));
//! ```

use std::time::Duration;

/// Default requested listen port
pub(crate) const DEFAULT_PORT: u16 = 7700;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Requested listen port
    ///
    /// If the port is taken, the next available port is used instead; the
    /// resolved port is reported by `Server::listen_port()`. Port 0 binds
    /// an ephemeral port.
    pub port: u16,

    /// Heartbeat timeout (None or zero disables heartbeats)
    ///
    /// When set, each idle session is sent a heartbeat control frame at
    /// this interval. A failed heartbeat write disconnects the session;
    /// this is the sole liveness-detection mechanism for peers that stop
    /// responding without closing their socket.
    pub heartbeat_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            heartbeat_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given requested port
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the requested listen port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the heartbeat timeout (None disables heartbeats)
    pub fn with_heartbeat_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Heartbeat timeout with a zero duration normalized to disabled
    pub(crate) fn effective_heartbeat(&self) -> Option<Duration> {
        self.heartbeat_timeout.filter(|t| !t.is_zero())
    }
}
