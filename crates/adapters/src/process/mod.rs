// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process introspection and termination

mod procfs;

pub use procfs::{ProcfsConfig, ProcfsIntrospector};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeIntrospector, FakeProcess, ProcessCall};

use async_trait::async_trait;
use std::path::PathBuf;
use tether_core::ProcessInfo;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process {0} not found")]
    NotFound(u32),
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed stat for process {pid}: {line}")]
    MalformedStat { pid: u32, line: String },
    #[error("stack dump failed: {0}")]
    DumpFailed(String),
    #[error("kill of process {pid} failed: {message}")]
    KillFailed { pid: u32, message: String },
}

/// Adapter for inspecting, dumping and killing host processes
#[async_trait]
pub trait ProcessIntrospector: Clone + Send + Sync + 'static {
    /// Native processes whose stacks accompany every dump
    async fn interesting_native_pids(&self) -> Vec<u32>;

    /// Identity of a live process
    async fn process_info(&self, pid: u32) -> Result<ProcessInfo, ProcessError>;

    /// Short executable name, or [`tether_core::UNKNOWN_PROCESS`]
    async fn process_name(&self, pid: u32) -> String;

    /// Whether the process runs inside the managed runtime
    async fn is_managed_process(&self, pid: u32) -> Result<bool, ProcessError>;

    /// Capture stack traces of the given processes
    async fn capture_stack_dump(&self, managed: &[u32], native: &[u32])
        -> Result<(), ProcessError>;

    async fn kill_process(&self, pid: u32) -> Result<(), ProcessError>;
}
