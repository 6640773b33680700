// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process introspector for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessError, ProcessIntrospector};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ProcessInfo, UNKNOWN_PROCESS};

/// Recorded process operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Dump { managed: Vec<u32>, native: Vec<u32> },
    Kill { pid: u32 },
}

/// A simulated process
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub name: String,
    pub managed: bool,
    pub start_time_ms: Option<u64>,
}

impl FakeProcess {
    pub fn managed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            managed: true,
            start_time_ms: None,
        }
    }

    pub fn native(name: &str) -> Self {
        Self {
            name: name.to_string(),
            managed: false,
            start_time_ms: None,
        }
    }

    pub fn started_at(mut self, start_time_ms: u64) -> Self {
        self.start_time_ms = Some(start_time_ms);
        self
    }
}

#[derive(Default)]
struct FakeIntrospectorState {
    processes: HashMap<u32, FakeProcess>,
    interesting: Vec<u32>,
    calls: Vec<ProcessCall>,
    dump_delay: Duration,
    fail_dump: bool,
    fail_kill: BTreeSet<u32>,
}

/// Fake introspector for testing
///
/// Killed processes disappear from the table. Dumps can be slowed down
/// with [`FakeIntrospector::set_dump_delay`], which sleeps on the tokio
/// clock so paused-time tests stay deterministic.
#[derive(Clone, Default)]
pub struct FakeIntrospector {
    inner: Arc<Mutex<FakeIntrospectorState>>,
}

impl FakeIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_process(&self, pid: u32, process: FakeProcess) {
        self.inner.lock().processes.insert(pid, process);
    }

    /// Simulate the process exiting on its own
    pub fn exit_process(&self, pid: u32) {
        self.inner.lock().processes.remove(&pid);
    }

    pub fn set_interesting(&self, pids: Vec<u32>) {
        self.inner.lock().interesting = pids;
    }

    pub fn set_dump_delay(&self, delay: Duration) {
        self.inner.lock().dump_delay = delay;
    }

    pub fn fail_dumps(&self) {
        self.inner.lock().fail_dump = true;
    }

    pub fn fail_kill(&self, pid: u32) {
        self.inner.lock().fail_kill.insert(pid);
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.inner.lock().processes.contains_key(&pid)
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    pub fn killed(&self) -> Vec<u32> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Kill { pid } => Some(*pid),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProcessIntrospector for FakeIntrospector {
    async fn interesting_native_pids(&self) -> Vec<u32> {
        self.inner.lock().interesting.clone()
    }

    async fn process_info(&self, pid: u32) -> Result<ProcessInfo, ProcessError> {
        let inner = self.inner.lock();
        let process = inner.processes.get(&pid).ok_or(ProcessError::NotFound(pid))?;
        Ok(ProcessInfo {
            pid,
            name: process.name.clone(),
            start_time_ms: process.start_time_ms,
        })
    }

    async fn process_name(&self, pid: u32) -> String {
        self.inner
            .lock()
            .processes
            .get(&pid)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_PROCESS.to_string())
    }

    async fn is_managed_process(&self, pid: u32) -> Result<bool, ProcessError> {
        let inner = self.inner.lock();
        let process = inner.processes.get(&pid).ok_or(ProcessError::NotFound(pid))?;
        Ok(process.managed)
    }

    async fn capture_stack_dump(
        &self,
        managed: &[u32],
        native: &[u32],
    ) -> Result<(), ProcessError> {
        let (delay, fail) = {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Dump {
                managed: managed.to_vec(),
                native: native.to_vec(),
            });
            (inner.dump_delay, inner.fail_dump)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ProcessError::DumpFailed("injected failure".to_string()));
        }
        Ok(())
    }

    async fn kill_process(&self, pid: u32) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Kill { pid });
        if inner.fail_kill.contains(&pid) {
            return Err(ProcessError::KillFailed {
                pid,
                message: "injected failure".to_string(),
            });
        }
        inner.processes.remove(&pid);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
