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

//! Error types for the Netline client
//!
//! Errors surface only from connection establishment. Once connected, I/O
//! faults are reported through the event stream as `ServerDisconnected`,
//! never as errors.

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Netline client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error while establishing the connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection attempt did not complete in time
    #[error("Connection to {0} timed out")]
    ConnectTimeout(String),
}
