// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination pipeline for clients the watchdog reports as unresponsive
//!
//! Batches are handled by one transient worker task, created on demand and
//! retired once every queued batch has finished. For each process the
//! worker captures a stack dump and then schedules the kill so that at
//! least the grace period has passed since the dump started. Kill waits
//! run as separate tasks and never hold up the next dump.

use crate::config::TerminatorConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tether_adapters::{ProcessIntrospector, WatchdogMonitor};
use tether_core::{ProcessIdentifier, ProcessKind, TerminationOutcome};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinSet;
use tokio::time::Instant;

type Batch = Vec<ProcessIdentifier>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminatorStatus {
    /// Batches queued or still waiting on kills
    pub in_flight: usize,
    pub has_worker: bool,
    pub workers_spawned: u64,
}

#[derive(Default)]
struct WorkerState {
    queue: Option<mpsc::UnboundedSender<Batch>>,
    in_flight: usize,
    workers_spawned: u64,
}

struct Inner<P, M> {
    introspector: P,
    monitor: M,
    config: TerminatorConfig,
    state: Mutex<WorkerState>,
    idle: Notify,
}

pub struct ProcessTerminator<P, M> {
    inner: Arc<Inner<P, M>>,
}

impl<P, M> Clone for ProcessTerminator<P, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, M> ProcessTerminator<P, M>
where
    P: ProcessIntrospector,
    M: WatchdogMonitor,
{
    pub fn new(introspector: P, monitor: M, config: TerminatorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                introspector,
                monitor,
                config,
                state: Mutex::new(WorkerState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue a batch of unresponsive clients. Must be called from a tokio runtime.
    pub fn request_terminate(&self, batch: Vec<ProcessIdentifier>) {
        if batch.is_empty() {
            tracing::debug!("empty termination batch, ignoring");
            return;
        }

        let mut state = self.inner.state.lock();
        let queue = match &state.queue {
            Some(queue) => queue.clone(),
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(Arc::clone(&self.inner).run_worker(rx));
                state.workers_spawned += 1;
                state.queue = Some(tx.clone());
                tracing::debug!(workers_spawned = state.workers_spawned, "termination worker started");
                tx
            }
        };
        state.in_flight += 1;

        let pids: Vec<u32> = batch.iter().map(|id| id.pid).collect();
        if queue.send(batch).is_err() {
            tracing::error!(?pids, "termination worker gone, dropping batch");
            state.in_flight -= 1;
            state.queue = None;
            return;
        }
        tracing::info!(?pids, in_flight = state.in_flight, "termination batch queued");
    }

    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().in_flight
    }

    pub fn has_worker(&self) -> bool {
        self.inner.state.lock().queue.is_some()
    }

    pub fn workers_spawned(&self) -> u64 {
        self.inner.state.lock().workers_spawned
    }

    pub fn status(&self) -> TerminatorStatus {
        let state = self.inner.state.lock();
        TerminatorStatus {
            in_flight: state.in_flight,
            has_worker: state.queue.is_some(),
            workers_spawned: state.workers_spawned,
        }
    }

    /// Wait until every queued batch has been reported.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl<P, M> Inner<P, M>
where
    P: ProcessIntrospector,
    M: WatchdogMonitor,
{
    async fn run_worker(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Batch>) {
        while let Some(batch) = rx.recv().await {
            self.process_batch(batch).await;
        }
        tracing::debug!("termination worker exiting");
    }

    async fn process_batch(self: &Arc<Self>, batch: Batch) {
        let mut kills = JoinSet::new();
        for id in batch {
            if let Some(delay) = self.dump(id).await {
                kills.spawn(Arc::clone(self).kill_after(id, delay));
            }
        }

        // Completion waits for the kills without blocking the next batch
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            while kills.join_next().await.is_some() {}
            inner.finish_batch();
        });
    }

    /// Dump one process. Returns the delay before its kill, or None to skip it.
    async fn dump(&self, id: ProcessIdentifier) -> Option<Duration> {
        let pid = id.pid;
        match self.introspector.process_info(pid).await {
            Ok(info) if info.matches(&id) => {}
            Ok(info) => {
                tracing::warn!(%info, reported = ?id.start_time_ms, "pid reused, skipping");
                return None;
            }
            Err(e) => {
                tracing::warn!(pid, error = %e, "cannot read process, skipping");
                return None;
            }
        }

        let kind = match self.introspector.is_managed_process(pid).await {
            Ok(true) => ProcessKind::Managed,
            Ok(false) => ProcessKind::Native,
            Err(e) => {
                tracing::warn!(pid, error = %e, "cannot get process information, skipping");
                return None;
            }
        };

        let interesting = self.introspector.interesting_native_pids().await;
        let (managed, native) = dump_targets(pid, kind, interesting);

        let started = Instant::now();
        if let Err(e) = self.introspector.capture_stack_dump(&managed, &native).await {
            tracing::warn!(pid, error = %e, "stack dump failed, killing anyway");
        }
        let elapsed = started.elapsed();
        tracing::debug!(pid, elapsed_ms = elapsed.as_millis() as u64, "dump finished");

        Some(self.config.kill_grace.saturating_sub(elapsed))
    }

    async fn kill_after(self: Arc<Self>, id: ProcessIdentifier, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let killed = self.kill(id).await;
        let outcome = TerminationOutcome {
            process: id,
            killed,
        };
        if let Err(e) = self.monitor.report_termination(&outcome).await {
            tracing::warn!(pid = id.pid, error = %e, "cannot report termination to monitor");
        }
    }

    async fn kill(&self, id: ProcessIdentifier) -> bool {
        let pid = id.pid;
        let info = match self.introspector.process_info(pid).await {
            Ok(info) if info.matches(&id) => info,
            Ok(info) => {
                tracing::warn!(%info, "pid reused before kill, skipping");
                return false;
            }
            Err(e) => {
                tracing::info!(pid, error = %e, "process exited before kill");
                return false;
            }
        };

        let name = self.introspector.process_name(pid).await;
        match self.introspector.kill_process(pid).await {
            Ok(()) => {
                tracing::warn!(process = %name, %info, "killed unresponsive client");
                true
            }
            Err(e) => {
                tracing::error!(process = %name, %info, error = %e, "kill failed");
                false
            }
        }
    }

    fn finish_batch(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight > 0 {
            return;
        }
        // Closing the queue lets the worker drain and exit
        state.queue = None;
        drop(state);
        tracing::debug!("termination queue drained");
        self.idle.notify_waiters();
    }
}

/// Split a client into managed and native dump lists.
///
/// Interesting native processes always accompany the client, without
/// duplicating the client itself.
fn dump_targets(pid: u32, kind: ProcessKind, interesting: Vec<u32>) -> (Vec<u32>, Vec<u32>) {
    let mut native = Vec::with_capacity(interesting.len() + 1);
    let managed = match kind {
        ProcessKind::Managed => vec![pid],
        ProcessKind::Native => {
            native.push(pid);
            Vec::new()
        }
    };
    for other in interesting {
        if other != pid && !native.contains(&other) {
            native.push(other);
        }
    }
    (managed, native)
}

#[cfg(test)]
#[path = "terminator_tests.rs"]
mod tests;
