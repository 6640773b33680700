// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor reached over a Unix socket, one connection per report.

use super::{MonitorError, WatchdogMonitor};
use crate::wire;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tether_core::TerminationOutcome;
use tokio::net::UnixStream;

const REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames sent to the watchdog monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorFrame {
    TerminationFinished { outcome: TerminationOutcome },
}

#[derive(Debug, Clone)]
pub struct SocketMonitor {
    path: PathBuf,
    timeout: Duration,
}

impl SocketMonitor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: REPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl WatchdogMonitor for SocketMonitor {
    async fn report_termination(&self, outcome: &TerminationOutcome) -> Result<(), MonitorError> {
        let connect = tokio::time::timeout(self.timeout, UnixStream::connect(&self.path));
        let mut stream = match connect.await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(MonitorError::ReportFailed(format!(
                    "connect {}: {}",
                    self.path.display(),
                    e
                )))
            }
            Err(_) => {
                return Err(MonitorError::ReportFailed(format!(
                    "connect {} timed out",
                    self.path.display()
                )))
            }
        };

        let frame = MonitorFrame::TerminationFinished { outcome: *outcome };
        wire::write_frame_timeout(&mut stream, &frame, self.timeout)
            .await
            .map_err(|e| MonitorError::ReportFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
