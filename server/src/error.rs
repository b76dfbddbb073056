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

//! Error types for the Netline server
//!
//! Errors surface only from server construction and shutdown. Runtime I/O
//! faults on individual connections are absorbed by the session layer and
//! reported through the event stream as `ClientDisconnected`, never as
//! errors to the facade caller.

use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Netline server error types
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error from the underlying TCP listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No port could be bound within the probe window
    #[error("No available port in range {start}..={end}")]
    NoAvailablePort {
        /// First port probed
        start: u16,
        /// Last port probed
        end: u16,
    },

    /// Server is not running
    #[error("Server not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::NoAvailablePort {
            start: 7700,
            end: 8211,
        };
        assert_eq!(err.to_string(), "No available port in range 7700..=8211");

        assert_eq!(ServerError::NotRunning.to_string(), "Server not running");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err = ServerError::from(io);
        assert!(matches!(err, ServerError::Io(_)));
    }
}
