// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog monitor adapters

mod noop;
mod socket;

pub use noop::NoOpMonitor;
pub use socket::{MonitorFrame, SocketMonitor};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMonitor;

use async_trait::async_trait;
use tether_core::TerminationOutcome;
use thiserror::Error;

/// Errors from monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("report failed: {0}")]
    ReportFailed(String),
}

/// Adapter for reporting terminations back to the watchdog
#[async_trait]
pub trait WatchdogMonitor: Clone + Send + Sync + 'static {
    async fn report_termination(&self, outcome: &TerminationOutcome) -> Result<(), MonitorError>;
}
