// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling them without blocking the engine loop. Requests that carry
//! an event are forwarded to the engine loop's channel.

use std::sync::Arc;

use parking_lot::Mutex;
use tether_adapters::WireError;
use tether_core::Event;
use tether_engine::RuntimeStatus;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    event_tx: mpsc::Sender<Event>,
    status: Arc<Mutex<RuntimeStatus>>,
    shutdown: Arc<Notify>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] WireError),

    #[error("Event loop closed")]
    EventLoopClosed,
}

impl Listener {
    pub fn new(
        socket: UnixListener,
        event_tx: mpsc::Sender<Event>,
        status: Arc<Mutex<RuntimeStatus>>,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            socket,
            event_tx,
            status,
            shutdown,
        }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let event_tx = self.event_tx.clone();
                    let status = Arc::clone(&self.status);
                    let shutdown = Arc::clone(&self.shutdown);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, event_tx, status, shutdown).await
                        {
                            match e {
                                ConnectionError::Protocol(WireError::ConnectionClosed) => {
                                    debug!("Client disconnected")
                                }
                                ConnectionError::Protocol(WireError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    stream: UnixStream,
    event_tx: mpsc::Sender<Event>,
    status: Arc<Mutex<RuntimeStatus>>,
    shutdown: Arc<Notify>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let response = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(request) => {
            if matches!(request, Request::Status) {
                debug!(request = ?request, "received query");
            } else {
                info!(request = ?request, "received request");
            }
            handle_request(request, &event_tx, &status, &shutdown).await?
        }
        // Malformed payloads get an answer; the connection itself is fine
        Err(WireError::Json(e)) => {
            warn!(error = %e, "malformed request");
            Response::Error {
                message: format!("malformed request: {e}"),
            }
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response.
async fn handle_request(
    request: Request,
    event_tx: &mpsc::Sender<Event>,
    status: &Mutex<RuntimeStatus>,
    shutdown: &Notify,
) -> Result<Response, ConnectionError> {
    match request {
        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Ok(Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            })
        }

        Request::Status => Ok(Response::Status {
            status: status.lock().clone(),
        }),

        Request::Shutdown => {
            shutdown.notify_one();
            Ok(Response::Ok)
        }

        request => {
            let Some(event) = request.into_event() else {
                return Ok(Response::Error {
                    message: "request carries no event".to_string(),
                });
            };
            event_tx
                .send(event)
                .await
                .map_err(|_| ConnectionError::EventLoopClosed)?;
            Ok(Response::Ok)
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
