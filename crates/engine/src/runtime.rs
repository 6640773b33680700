// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime that routes events to the supervisor and the terminator

use crate::config::RuntimeConfig;
use crate::supervisor::{ConnectionSupervisor, SupervisorStatus};
use crate::terminator::{ProcessTerminator, TerminatorStatus};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tether_adapters::{HostEscalation, ProcessIntrospector, Transport, WatchdogMonitor};
use tether_core::{Clock, Event};
use tokio::sync::mpsc;

/// Runtime adapter dependencies
pub struct RuntimeDeps<T, H, P, M> {
    pub transport: T,
    pub host: H,
    pub introspector: P,
    pub monitor: M,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub supervisor: SupervisorStatus,
    pub terminator: TerminatorStatus,
}

pub struct Runtime<T, H, P, M, C: Clock> {
    supervisor: ConnectionSupervisor<T, H, C>,
    terminator: ProcessTerminator<P, M>,
}

impl<T, H, P, M, C> Runtime<T, H, P, M, C>
where
    T: Transport,
    H: HostEscalation,
    P: ProcessIntrospector,
    M: WatchdogMonitor,
    C: Clock,
{
    pub fn new(
        deps: RuntimeDeps<T, H, P, M>,
        clock: C,
        config: RuntimeConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            supervisor: ConnectionSupervisor::new(
                deps.transport,
                deps.host,
                clock,
                config.supervisor,
                event_tx,
            ),
            terminator: ProcessTerminator::new(deps.introspector, deps.monitor, config.terminator),
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<T, H, C> {
        &self.supervisor
    }

    pub fn terminator(&self) -> &ProcessTerminator<P, M> {
        &self.terminator
    }

    /// Handle an incoming event
    pub async fn handle_event(&mut self, event: Event) {
        tracing::debug!(event = event.name(), "handling event");
        match event {
            Event::Lifecycle { event } => self.supervisor.on_lifecycle(event).await,
            Event::Submit { op } => self.supervisor.submit(op).await,
            Event::ClearReset => self.supervisor.clear_reset(),
            Event::ConnectRequested => self.supervisor.request_connection().await,
            Event::HandshakeCompleted { handle } => self.supervisor.on_connected(handle).await,
            Event::HandshakeFailed { reason } => self.supervisor.on_handshake_failed(&reason).await,
            Event::Disconnected => self.supervisor.on_disconnected().await,
            Event::TimerStart { id } => self.supervisor.on_timer(&id).await,
            Event::ClientsNotResponding { processes } => {
                self.terminator.request_terminate(processes)
            }
            Event::Shutdown => self.supervisor.shutdown().await,
        }
    }

    /// Fire due supervisor timers (for the daemon's timer tick)
    pub async fn check_timers(&mut self) {
        self.supervisor.check_timers().await;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.supervisor.next_deadline()
    }

    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus {
            supervisor: self.supervisor.status(),
            terminator: self.terminator.status(),
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
