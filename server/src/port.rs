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

//! Listen port allocation
//!
//! Finds the first port at or above a requested value that can be bound for
//! both TCP and UDP. Probe sockets are dropped immediately on success, so a
//! small race window exists between probing and the caller's own bind; the
//! caller should treat the result as a strong hint, not a reservation.

use crate::{Result, ServerError};
use tokio::net::{TcpListener, UdpSocket};

/// Maximum number of consecutive ports probed before giving up
const MAX_PORT_PROBES: u16 = 512;

/// Find the first available TCP+UDP port at or above `start`
///
/// A port counts as available only when both a TCP listener and a UDP
/// socket can be bound on it. The scan is bounded: after
/// `MAX_PORT_PROBES` occupied ports (or the end of the port range) the
/// search fails with [`ServerError::NoAvailablePort`].
pub async fn find_available_port(start: u16) -> Result<u16> {
    let mut port = start;
    for _ in 0..MAX_PORT_PROBES {
        if port_is_free(port).await {
            return Ok(port);
        }
        tracing::debug!(port, "port occupied, probing next");
        match port.checked_add(1) {
            Some(next) => port = next,
            None => break,
        }
    }
    Err(ServerError::NoAvailablePort { start, end: port })
}

/// Probe a single port by binding both sockets, then releasing them
async fn port_is_free(port: u16) -> bool {
    let tcp = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(_) => return false,
    };
    let free = UdpSocket::bind(("0.0.0.0", port)).await.is_ok();
    drop(tcp);
    free
}
