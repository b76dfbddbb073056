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

//! Structured key/value message container and its JSON wire encoding
//!
//! A [`Message`] is an ordered mapping of string keys to JSON values. On the
//! wire each message is one UTF-8 JSON object per line. Key insertion order
//! is preserved end to end, so a message round-trips byte-identical.
//!
//! Two keys are reserved for the transport layer:
//!
//! - [`HEARTBEAT_KEY`] marks a liveness control frame. Heartbeat frames are
//!   consumed by the session layer and never surfaced as application events.
//! - [`RAW_TEXT_KEY`] wraps an inbound line that failed to decode as JSON,
//!   so malformed input still reaches the application as data rather than
//!   being dropped or raised as an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Reserved marker key identifying a heartbeat control frame
pub const HEARTBEAT_KEY: &str = "__heartbeat__";

/// Reserved key wrapping raw text that failed to decode as JSON
pub const RAW_TEXT_KEY: &str = "__raw_text__";

/// Result type for message operations
pub type Result<T> = std::result::Result<T, MessageError>;

/// Message encoding/decoding error types
#[derive(Debug, Error)]
pub enum MessageError {
    /// Input was not a well-formed JSON object
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An ordered mapping of string keys to JSON values
///
/// This is the only payload type exchanged between peers. The transport
/// never interprets message content beyond the reserved [`HEARTBEAT_KEY`]
/// check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    entries: Map<String, Value>,
}

impl Message {
    /// Create a new, empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a heartbeat control frame
    ///
    /// Heartbeats carry nothing but the reserved marker key.
    pub fn heartbeat() -> Self {
        Self::new().with(HEARTBEAT_KEY, true)
    }

    /// Wrap text that failed to decode under the reserved raw-text key
    pub fn raw_text(text: impl Into<String>) -> Self {
        Self::new().with(RAW_TEXT_KEY, text.into())
    }

    /// Decode a message from one line of JSON text
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode this message as a single line of JSON text
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Insert a value, replacing any previous value under the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style insert for constructing messages inline
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get the value stored under a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a string value stored under a key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Get a numeric value stored under a key
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(Value::as_f64)
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Check whether this message is a heartbeat control frame
    pub fn is_heartbeat(&self) -> bool {
        self.contains_key(HEARTBEAT_KEY)
    }

    /// Number of entries in the message
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the message has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Map<String, Value>> for Message {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(text) => write!(f, "{}", text),
            Err(_) => write!(f, "{{}}"),
        }
    }
}
