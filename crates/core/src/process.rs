// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process identity as reported by the watchdog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used when a process name cannot be read.
pub const UNKNOWN_PROCESS: &str = "unknown process";

/// A process reported as unresponsive.
///
/// `start_time_ms` is either the process's actual start time or the last
/// time the reporter saw it alive. It guards against killing a reused pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessIdentifier {
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
}

impl ProcessIdentifier {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            start_time_ms: None,
        }
    }

    pub fn with_start_time(pid: u32, start_time_ms: u64) -> Self {
        Self {
            pid,
            start_time_ms: Some(start_time_ms),
        }
    }
}

impl fmt::Display for ProcessIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pid)
    }
}

/// What the host knows about a live process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Start time since boot, if readable.
    pub start_time_ms: Option<u64>,
}

impl ProcessInfo {
    /// Whether this live process is the one that was reported.
    ///
    /// The reported start time must be at or after the actual start time;
    /// an unknown start time on either side is treated as a match.
    pub fn matches(&self, id: &ProcessIdentifier) -> bool {
        if self.pid != id.pid {
            return false;
        }
        match (self.start_time_ms, id.start_time_ms) {
            (Some(actual), Some(reported)) => actual <= reported,
            _ => true,
        }
    }
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start_time_ms {
            Some(start) => write!(
                f,
                "{} (pid: {}, start_time_ms: {})",
                self.name, self.pid, start
            ),
            None => write!(f, "{} (pid: {})", self.name, self.pid),
        }
    }
}

/// How a process is hosted, which decides how its stacks are dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// Runs inside the managed runtime.
    Managed,
    Native,
}

/// Result of a termination, reported back to the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationOutcome {
    pub process: ProcessIdentifier,
    pub killed: bool,
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
