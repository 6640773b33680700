// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between host components and the daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tether_adapters::wire::{self, WireError};
use tether_core::{Event, LifecycleEvent, PendingOp, ProcessIdentifier};
use tether_engine::RuntimeStatus;

/// Default IPC timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request from a host component to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Version handshake
    Hello { version: String },

    /// A user session changed lifecycle stage
    Lifecycle { event: LifecycleEvent },

    /// A state-changing operation for the companion
    Submit { op: PendingOp },

    /// Stop replaying the stored factory reset
    ClearReset,

    /// Ask the supervisor to (re)connect to the companion
    Connect,

    /// The watchdog reports these clients as unresponsive
    ClientsNotResponding { processes: Vec<ProcessIdentifier> },

    Status,

    Shutdown,
}

impl Request {
    /// Event for the engine loop, for requests that carry one
    pub fn into_event(self) -> Option<Event> {
        match self {
            Request::Lifecycle { event } => Some(Event::Lifecycle { event }),
            Request::Submit { op } => Some(Event::Submit { op }),
            Request::ClearReset => Some(Event::ClearReset),
            Request::Connect => Some(Event::ConnectRequested),
            Request::ClientsNotResponding { processes } => {
                Some(Event::ClientsNotResponding { processes })
            }
            Request::Hello { .. } | Request::Status | Request::Shutdown => None,
        }
    }
}

/// Response from the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Hello { version: String },
    Status { status: RuntimeStatus },
    Error { message: String },
}

/// Read a request with timeout
pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, WireError> {
    wire::read_frame_timeout(reader, timeout).await
}

/// Write a response with timeout
pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), WireError> {
    wire::write_frame_timeout(writer, response, timeout).await
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
