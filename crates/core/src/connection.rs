// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state of the companion link.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the link to the companion.
///
/// There is no terminal state: the link cycles for the life of the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Connection requested, waiting for the companion's handshake.
    Connecting,
    Connected,
    /// The companion died or a call could not be delivered.
    Crashed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Crashed => "crashed",
        };
        f.write_str(s)
    }
}
