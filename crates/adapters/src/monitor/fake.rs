// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake monitor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MonitorError, WatchdogMonitor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tether_core::TerminationOutcome;
use tokio::time::Instant;

#[derive(Default)]
struct FakeMonitorState {
    reports: Vec<(TerminationOutcome, Instant)>,
    fail: bool,
}

/// Fake monitor that records reports with the tokio time they arrived
#[derive(Clone, Default)]
pub struct FakeMonitor {
    inner: Arc<Mutex<FakeMonitorState>>,
}

impl FakeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<TerminationOutcome> {
        self.inner.lock().reports.iter().map(|(o, _)| *o).collect()
    }

    /// When the report for `pid` arrived
    pub fn reported_at(&self, pid: u32) -> Option<Instant> {
        self.inner
            .lock()
            .reports
            .iter()
            .find(|(o, _)| o.process.pid == pid)
            .map(|(_, at)| *at)
    }

    /// Record reports but return an error for each
    pub fn fail_reports(&self) {
        self.inner.lock().fail = true;
    }
}

#[async_trait]
impl WatchdogMonitor for FakeMonitor {
    async fn report_termination(&self, outcome: &TerminationOutcome) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock();
        inner.reports.push((*outcome, Instant::now()));
        if inner.fail {
            return Err(MonitorError::ReportFailed("injected failure".to_string()));
        }
        Ok(())
    }
}
