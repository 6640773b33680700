// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection supervisor for the companion process
//!
//! Owns the connection state, the deferred operation table and the
//! lifecycle record. All methods take `&mut self` and are driven from a
//! single loop, so a flush can never interleave with a submit.
//!
//! State machine:
//! ```text
//! Disconnected -> Connecting -> Connected -> Crashed -> Connecting -> ...
//! ```
//! A missing handshake while `Connecting` is escalated to the host once.

use crate::config::SupervisorConfig;
use crate::scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tether_adapters::{HostEscalation, Transport};
use tether_core::{
    Clock, CompanionCall, ConnectionState, Event, LifecycleEvent, LifecycleStore, PendingKind,
    PendingOp, PendingStore, PendingSummary, RemoteHandle, SessionId, TimerId,
};
use tokio::sync::mpsc;

/// Diagnostic view of the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorStatus {
    pub state: ConnectionState,
    pub pending: PendingSummary,
    pub tracked_sessions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_session: Option<SessionId>,
    /// Number of handshakes that triggered a flush
    pub flush_count: u64,
    pub handshake_armed: bool,
    pub reconnect_armed: bool,
}

pub struct ConnectionSupervisor<T, H, C: Clock> {
    transport: T,
    host: H,
    clock: C,
    config: SupervisorConfig,
    event_tx: mpsc::Sender<Event>,
    state: ConnectionState,
    handle: Option<RemoteHandle>,
    pending: PendingStore,
    lifecycle: LifecycleStore,
    scheduler: Scheduler,
    /// Set once the host was told the companion is unresponsive
    escalated: bool,
    flush_count: u64,
}

impl<T, H, C> ConnectionSupervisor<T, H, C>
where
    T: Transport,
    H: HostEscalation,
    C: Clock,
{
    /// `event_tx` is handed to the transport so handshakes and
    /// disconnects come back through the owner's loop.
    pub fn new(
        transport: T,
        host: H,
        clock: C,
        config: SupervisorConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            transport,
            host,
            clock,
            config,
            event_tx,
            state: ConnectionState::Disconnected,
            handle: None,
            pending: PendingStore::new(),
            lifecycle: LifecycleStore::new(),
            scheduler: Scheduler::new(),
            escalated: false,
            flush_count: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    pub fn lifecycle(&self) -> &LifecycleStore {
        &self.lifecycle
    }

    /// Start a connection attempt under a fresh handshake deadline.
    ///
    /// Ignored while connected.
    pub async fn request_connection(&mut self) {
        if self.state.is_connected() {
            tracing::debug!("already connected, ignoring connection request");
            return;
        }

        let now = self.clock.now();
        self.scheduler.cancel_timer(TimerId::reconnect().as_str());
        self.scheduler.cancel_timer(TimerId::handshake().as_str());
        self.scheduler
            .set_timer(TimerId::handshake(), self.config.handshake_timeout, now);
        self.state = ConnectionState::Connecting;
        self.handle = None;
        self.escalated = false;

        tracing::info!(
            timeout_ms = self.config.handshake_timeout.as_millis() as u64,
            "connecting to companion"
        );
        if let Err(e) = self.transport.connect(self.event_tx.clone()).await {
            // The handshake deadline decides what happens next
            tracing::warn!(error = %e, "connection attempt failed");
        }
    }

    /// Send an operation now if connected, otherwise defer it.
    ///
    /// A factory reset is always recorded so it is replayed on every
    /// reconnect until [`ConnectionSupervisor::clear_reset`].
    pub async fn submit(&mut self, op: PendingOp) {
        let is_reset = op.kind() == PendingKind::Reset;
        if is_reset {
            self.pending.save(op);
        }

        if let Some(handle) = self.connected_handle() {
            let call = CompanionCall::from(op);
            match self.transport.call_one_way(&handle, &call).await {
                Ok(()) => {
                    tracing::debug!(%call, "sent");
                    return;
                }
                Err(e) => {
                    tracing::warn!(%call, error = %e, "send failed, deferring");
                    if !is_reset {
                        self.pending.save(op);
                    }
                    self.on_transport_failure().await;
                    return;
                }
            }
        }

        if !is_reset {
            self.pending.save(op);
        }
        tracing::debug!(op = op.kind().name(), state = %self.state, "deferred");
    }

    pub fn clear_reset(&mut self) {
        if let Some(request) = self.pending.clear_reset() {
            tracing::info!(callback_id = request.callback_id, "cleared factory reset");
        }
    }

    /// Record a lifecycle transition and forward it if connected.
    ///
    /// Never queued: the lifecycle record is replayed on the next connect.
    pub async fn on_lifecycle(&mut self, event: LifecycleEvent) {
        self.lifecycle.record(&event);

        let Some(handle) = self.connected_handle() else {
            tracing::debug!(%event, "recorded, companion not connected");
            return;
        };
        let call = CompanionCall::from(event);
        if let Err(e) = self.transport.call_one_way(&handle, &call).await {
            tracing::warn!(%event, error = %e, "lifecycle forward failed");
            self.on_transport_failure().await;
        }
    }

    /// Companion handshake: flush deferred operations, then replay lifecycle.
    ///
    /// Only accepted while an attempt is open or as a re-handshake; a
    /// handshake queued by an aborted connection is dropped.
    pub async fn on_connected(&mut self, handle: RemoteHandle) {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            tracing::debug!(%handle, state = %self.state, "ignoring stale handshake");
            return;
        }
        self.scheduler.cancel_timer(TimerId::handshake().as_str());
        self.scheduler.cancel_timer(TimerId::reconnect().as_str());
        self.state = ConnectionState::Connected;
        self.handle = Some(handle.clone());
        self.flush_count += 1;
        tracing::info!(%handle, flush = self.flush_count, "companion connected");

        if !self.flush(&handle).await {
            return;
        }
        self.replay(&handle).await;
    }

    /// Send deferred operations in flush order. Returns false if a send failed.
    async fn flush(&mut self, handle: &RemoteHandle) -> bool {
        for kind in PendingKind::FLUSH_ORDER {
            let Some(pending) = self.pending.take(kind) else {
                continue;
            };
            let mut ops = pending.into_ops().into_iter();
            while let Some(op) = ops.next() {
                let call = CompanionCall::from(op);
                if let Err(e) = self.transport.call_one_way(handle, &call).await {
                    tracing::warn!(%call, error = %e, "flush interrupted");
                    let mut unsent = vec![op];
                    unsent.extend(ops);
                    self.pending.restore(unsent);
                    self.on_transport_failure().await;
                    return false;
                }
                tracing::debug!(%call, "flushed");
            }
        }
        true
    }

    async fn replay(&mut self, handle: &RemoteHandle) {
        let events = self.lifecycle.snapshot().replay_events();
        let count = events.len();
        for event in events {
            let call = CompanionCall::from(event);
            if let Err(e) = self.transport.call_one_way(handle, &call).await {
                tracing::warn!(%call, error = %e, "lifecycle replay interrupted");
                self.on_transport_failure().await;
                return;
            }
        }
        tracing::info!(events = count, "lifecycle replayed");
    }

    /// The companion answered without a usable handle.
    pub async fn on_handshake_failed(&mut self, reason: &str) {
        tracing::error!(reason, "companion handshake failed");
        self.scheduler.cancel_timer(TimerId::handshake().as_str());
        self.escalate_unresponsive().await;
    }

    /// The companion's connection went away.
    pub async fn on_disconnected(&mut self) {
        match self.state {
            ConnectionState::Crashed | ConnectionState::Disconnected => {
                tracing::debug!(state = %self.state, "ignoring stale disconnect");
            }
            ConnectionState::Connecting | ConnectionState::Connected => {
                tracing::warn!(state = %self.state, "companion disconnected");
                self.crash().await;
            }
        }
    }

    /// A call could not be delivered; the companion is presumed dead.
    pub async fn on_transport_failure(&mut self) {
        self.transport.disconnect().await;
        self.crash().await;
    }

    async fn crash(&mut self) {
        self.state = ConnectionState::Crashed;
        self.handle = None;
        self.scheduler.cancel_timer(TimerId::handshake().as_str());
        self.scheduler.set_timer(
            TimerId::reconnect(),
            self.config.reconnect_delay,
            self.clock.now(),
        );
        self.host.on_companion_crashed().await;
    }

    async fn escalate_unresponsive(&mut self) {
        if self.escalated {
            return;
        }
        self.escalated = true;
        tracing::error!("companion unresponsive, escalating to host");
        self.host.on_companion_unresponsive().await;
    }

    /// Fire due timers against the injected clock.
    pub async fn check_timers(&mut self) {
        let now = self.clock.now();
        for event in self.scheduler.fired_timers(now) {
            if let Event::TimerStart { id } = event {
                self.on_timer(&id).await;
            }
        }
    }

    /// Earliest armed timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub async fn on_timer(&mut self, id: &TimerId) {
        if id.is_handshake() {
            if self.state == ConnectionState::Connecting {
                tracing::error!(
                    timeout_ms = self.config.handshake_timeout.as_millis() as u64,
                    "no handshake before deadline"
                );
                self.escalate_unresponsive().await;
            } else {
                tracing::debug!(state = %self.state, "handshake deadline passed, not connecting");
            }
        } else if id.is_reconnect() {
            if self.state == ConnectionState::Crashed {
                self.request_connection().await;
            }
        } else {
            tracing::warn!(%id, "unknown timer");
        }
    }

    /// Drop the connection and all timers. Stored state is kept.
    pub async fn shutdown(&mut self) {
        self.scheduler.cancel_timer(TimerId::handshake().as_str());
        self.scheduler.cancel_timer(TimerId::reconnect().as_str());
        self.transport.disconnect().await;
        self.state = ConnectionState::Disconnected;
        self.handle = None;
    }

    pub fn status(&self) -> SupervisorStatus {
        SupervisorStatus {
            state: self.state,
            pending: self.pending.summary(),
            tracked_sessions: self.lifecycle.len(),
            current_session: self.lifecycle.current_session(),
            flush_count: self.flush_count,
            handshake_armed: self.scheduler.is_armed(TimerId::handshake().as_str()),
            reconnect_armed: self.scheduler.is_armed(TimerId::reconnect().as_str()),
        }
    }

    fn connected_handle(&self) -> Option<RemoteHandle> {
        if self.state.is_connected() {
            self.handle.clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
