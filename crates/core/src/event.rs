// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events processed by the engine loop.

use crate::call::RemoteHandle;
use crate::pending::PendingOp;
use crate::process::ProcessIdentifier;
use crate::session::LifecycleEvent;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};

/// Inputs to the engine loop, handled one at a time.
///
/// Serializes with `{"type": "area:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- host --
    /// A session moved to a new lifecycle stage on the host.
    #[serde(rename = "host:lifecycle")]
    Lifecycle { event: LifecycleEvent },

    /// A state-changing operation for the companion.
    #[serde(rename = "host:submit")]
    Submit { op: PendingOp },

    /// The host acted on the stored factory reset.
    #[serde(rename = "host:clear_reset")]
    ClearReset,

    // -- companion --
    #[serde(rename = "companion:connect")]
    ConnectRequested,

    #[serde(rename = "companion:handshake")]
    HandshakeCompleted { handle: RemoteHandle },

    /// The companion answered the handshake without a usable handle.
    #[serde(rename = "companion:handshake_failed")]
    HandshakeFailed { reason: String },

    #[serde(rename = "companion:disconnected")]
    Disconnected,

    // -- watchdog --
    #[serde(rename = "watchdog:not_responding")]
    ClientsNotResponding { processes: Vec<ProcessIdentifier> },

    // -- timer --
    #[serde(rename = "timer:start")]
    TimerStart { id: TimerId },

    // -- system --
    #[serde(rename = "system:shutdown")]
    Shutdown,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Lifecycle { .. } => "host:lifecycle",
            Event::Submit { .. } => "host:submit",
            Event::ClearReset => "host:clear_reset",
            Event::ConnectRequested => "companion:connect",
            Event::HandshakeCompleted { .. } => "companion:handshake",
            Event::HandshakeFailed { .. } => "companion:handshake_failed",
            Event::Disconnected => "companion:disconnected",
            Event::ClientsNotResponding { .. } => "watchdog:not_responding",
            Event::TimerStart { .. } => "timer:start",
            Event::Shutdown => "system:shutdown",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
