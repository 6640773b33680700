// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{ProcessError, ProcessIntrospector};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use tether_core::{CompanionCall, Event, ProcessInfo, RemoteHandle};
use tokio::sync::mpsc;
use tracing::Instrument;

/// Wrapper that adds tracing to any Transport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for TracedTransport<T> {
    async fn connect(&self, event_tx: mpsc::Sender<Event>) -> Result<(), TransportError> {
        async {
            tracing::info!("connecting");
            let start = std::time::Instant::now();
            let result = self.inner.connect(event_tx).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "awaiting handshake"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "connect failed"),
            }
            result
        }
        .instrument(tracing::info_span!("transport.connect"))
        .await
    }

    async fn call_one_way(
        &self,
        handle: &RemoteHandle,
        call: &CompanionCall,
    ) -> Result<(), TransportError> {
        tracing::info_span!("transport.call", %handle, call = call.name())
            .in_scope(|| tracing::debug!(%call, "sending"));
        let result = self.inner.call_one_way(handle, call).await;
        if let Err(ref e) = result {
            tracing::error!(call = call.name(), error = %e, "call failed");
        }
        result
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await;
        tracing::info_span!("transport.disconnect").in_scope(|| tracing::info!("disconnected"));
    }
}

/// Wrapper that adds tracing to any ProcessIntrospector
#[derive(Clone)]
pub struct TracedIntrospector<P> {
    inner: P,
}

impl<P> TracedIntrospector<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessIntrospector> ProcessIntrospector for TracedIntrospector<P> {
    async fn interesting_native_pids(&self) -> Vec<u32> {
        let pids = self.inner.interesting_native_pids().await;
        tracing::trace!(count = pids.len(), "interesting native pids");
        pids
    }

    async fn process_info(&self, pid: u32) -> Result<ProcessInfo, ProcessError> {
        let result = self.inner.process_info(pid).await;
        tracing::trace!(pid, info = ?result.as_ref().ok(), "read process info");
        result
    }

    async fn process_name(&self, pid: u32) -> String {
        self.inner.process_name(pid).await
    }

    async fn is_managed_process(&self, pid: u32) -> Result<bool, ProcessError> {
        let result = self.inner.is_managed_process(pid).await;
        tracing::trace!(pid, managed = ?result.as_ref().ok(), "checked");
        result
    }

    async fn capture_stack_dump(
        &self,
        managed: &[u32],
        native: &[u32],
    ) -> Result<(), ProcessError> {
        let span = tracing::info_span!("process.dump", managed = ?managed, native_count = native.len());
        async {
            tracing::info!("dumping stacks");
            let start = std::time::Instant::now();
            let result = self.inner.capture_stack_dump(managed, native).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "stacks dumped"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "dump failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn kill_process(&self, pid: u32) -> Result<(), ProcessError> {
        let result = self.inner.kill_process(pid).await;
        tracing::info_span!("process.kill", pid).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
