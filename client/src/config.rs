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

//! Client configuration
//!
//! # Example
//!
//! ```
//! use netline_client::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("example.com", 7700)
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_heartbeat_timeout(Some(Duration::from_millis(500)));
//! ```

use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Heartbeat timeout (None or zero disables heartbeats)
    ///
    /// When set, the client writes a heartbeat control frame whenever the
    /// connection has been quiet past this interval, mirroring the server
    /// side's liveness contract.
    pub heartbeat_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7700,
            connect_timeout: Duration::from_secs(10),
            heartbeat_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the heartbeat timeout (None disables heartbeats)
    pub fn with_heartbeat_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Heartbeat timeout with a zero duration normalized to disabled
    pub(crate) fn effective_heartbeat(&self) -> Option<Duration> {
        self.heartbeat_timeout.filter(|t| !t.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chaining() {
        let config = ClientConfig::new("example.com", 9000)
            .with_connect_timeout(Duration::from_secs(3))
            .with_heartbeat_timeout(Some(Duration::from_millis(250)));

        assert_eq!(config.address(), "example.com:9000");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(
            config.effective_heartbeat(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_zero_heartbeat_disables() {
        let config = ClientConfig::default().with_heartbeat_timeout(Some(Duration::ZERO));
        assert!(config.effective_heartbeat().is_none());
    }
}
