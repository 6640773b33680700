// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport to the companion process
//!
//! Connecting is asynchronous and single-shot: `connect` only starts the
//! attempt. The companion's handshake (or its death) arrives later as an
//! [`Event`] on the channel passed to `connect`.

mod socket;

pub use socket::{CompanionFrame, HostFrame, UnixSocketTransport, DEFAULT_CALL_TIMEOUT};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};

use async_trait::async_trait;
use tether_core::{CompanionCall, Event, RemoteHandle};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("call failed: {0}")]
    CallFailed(String),
}

/// Adapter for reaching the companion process
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Start a connection attempt.
    ///
    /// Emits `HandshakeCompleted`, `HandshakeFailed` or `Disconnected` on
    /// `event_tx` once the companion answers or goes away.
    async fn connect(&self, event_tx: mpsc::Sender<Event>) -> Result<(), TransportError>;

    /// Fire-and-forget call. An error means the companion is presumed gone.
    async fn call_one_way(
        &self,
        handle: &RemoteHandle,
        call: &CompanionCall,
    ) -> Result<(), TransportError>;

    /// Drop the current connection, if any. No event is emitted.
    async fn disconnect(&self);
}
