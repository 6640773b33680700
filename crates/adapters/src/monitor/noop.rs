// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op monitor.

use super::{MonitorError, WatchdogMonitor};
use async_trait::async_trait;
use tether_core::TerminationOutcome;

/// Monitor that discards every report.
///
/// Used when no monitor socket is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMonitor;

impl NoOpMonitor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WatchdogMonitor for NoOpMonitor {
    async fn report_termination(&self, _outcome: &TerminationOutcome) -> Result<(), MonitorError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
