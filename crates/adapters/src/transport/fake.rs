// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tether_core::{CompanionCall, Event, RemoteHandle};
use tokio::sync::mpsc;

/// Recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect,
    Call {
        handle: RemoteHandle,
        call: CompanionCall,
    },
    Disconnect,
}

#[derive(Default)]
struct FakeTransportState {
    calls: Vec<TransportCall>,
    /// Successful one-way calls left before every call fails
    calls_before_failure: Option<usize>,
    connect_error: Option<String>,
    event_tx: Option<mpsc::Sender<Event>>,
}

/// Fake transport for testing
///
/// Records every call. Failures can be injected after a number of
/// successful one-way calls.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    /// Companion calls delivered successfully, in order
    pub fn sent(&self) -> Vec<CompanionCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Call { call, .. } => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, TransportCall::Connect))
            .count()
    }

    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    /// Make every one-way call fail
    pub fn fail_calls(&self) {
        self.inner.lock().calls_before_failure = Some(0);
    }

    /// Let `n` more one-way calls succeed, then fail the rest
    pub fn fail_after(&self, n: usize) {
        self.inner.lock().calls_before_failure = Some(n);
    }

    pub fn heal(&self) {
        self.inner.lock().calls_before_failure = None;
    }

    pub fn set_connect_error(&self, message: &str) {
        self.inner.lock().connect_error = Some(message.to_string());
    }

    /// Channel handed over by the last `connect`, to simulate the companion
    pub fn event_tx(&self) -> Option<mpsc::Sender<Event>> {
        self.inner.lock().event_tx.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, event_tx: mpsc::Sender<Event>) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Connect);
        if let Some(message) = inner.connect_error.clone() {
            return Err(TransportError::ConnectFailed(message));
        }
        inner.event_tx = Some(event_tx);
        Ok(())
    }

    async fn call_one_way(
        &self,
        handle: &RemoteHandle,
        call: &CompanionCall,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        match inner.calls_before_failure {
            Some(0) => return Err(TransportError::CallFailed("injected failure".to_string())),
            Some(n) => inner.calls_before_failure = Some(n - 1),
            None => {}
        }
        inner.calls.push(TransportCall::Call {
            handle: handle.clone(),
            call: call.clone(),
        });
        Ok(())
    }

    async fn disconnect(&self) {
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Disconnect);
        inner.event_tx = None;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
