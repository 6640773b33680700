// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix socket transport using the length-prefixed JSON wire format.

use super::{Transport, TransportError};
use crate::wire::{self, WireError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{CompanionCall, Event, RemoteHandle};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default bound on a single frame write to the companion.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Frames sent from the host to the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostFrame {
    /// First frame on every connection; the companion answers with a handshake.
    Hello { host_pid: u32 },
    Call {
        handle: RemoteHandle,
        call: CompanionCall,
    },
}

/// Frames sent from the companion to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompanionFrame {
    Handshake {
        #[serde(default)]
        handle: Option<RemoteHandle>,
    },
}

/// Transport over a Unix socket served by the companion.
///
/// Every write is bounded by the call timeout. A companion that stops
/// reading fails the call instead of stalling the caller.
#[derive(Clone)]
pub struct UnixSocketTransport {
    path: PathBuf,
    call_timeout: Duration,
    writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>,
    reader: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl UnixSocketTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            writer: Arc::new(tokio::sync::Mutex::new(None)),
            reader: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stop_reader(&self) {
        if let Some(task) = self.reader.lock().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn connect(&self, event_tx: mpsc::Sender<Event>) -> Result<(), TransportError> {
        self.disconnect().await;

        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| TransportError::ConnectFailed(format!("{}: {}", self.path.display(), e)))?;
        let (read_half, mut write_half) = stream.into_split();

        let hello = HostFrame::Hello {
            host_pid: std::process::id(),
        };
        wire::write_frame_timeout(&mut write_half, &hello, self.call_timeout)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        *self.writer.lock().await = Some(write_half);
        let task = tokio::spawn(read_companion_frames(read_half, event_tx));
        *self.reader.lock() = Some(task);
        Ok(())
    }

    async fn call_one_way(
        &self,
        handle: &RemoteHandle,
        call: &CompanionCall,
    ) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        let frame = HostFrame::Call {
            handle: handle.clone(),
            call: call.clone(),
        };
        if let Err(e) = wire::write_frame_timeout(stream, &frame, self.call_timeout).await {
            *writer = None;
            return Err(TransportError::CallFailed(e.to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.stop_reader();
        *self.writer.lock().await = None;
    }
}

/// Forward companion frames to the engine until the stream ends.
async fn read_companion_frames(mut reader: OwnedReadHalf, event_tx: mpsc::Sender<Event>) {
    loop {
        let event = match wire::read_frame::<CompanionFrame, _>(&mut reader).await {
            Ok(CompanionFrame::Handshake {
                handle: Some(handle),
            }) => Event::HandshakeCompleted { handle },
            Ok(CompanionFrame::Handshake { handle: None }) => Event::HandshakeFailed {
                reason: "companion returned no handle".to_string(),
            },
            Err(WireError::ConnectionClosed) => {
                tracing::info!("companion closed the connection");
                let _ = event_tx.send(Event::Disconnected).await;
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "companion stream failed");
                let _ = event_tx.send(Event::Disconnected).await;
                return;
            }
        };
        if event_tx.send(event).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
