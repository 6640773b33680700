// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escalation back to the host process
//!
//! The supervisor never holds a reference to its owner. Conditions it cannot
//! handle itself are raised through [`HostEscalation`] and acted on by the
//! daemon loop.

mod channel;

pub use channel::ChannelHost;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHost;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition raised to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// No usable handshake arrived in time. Fatal for the host.
    CompanionUnresponsive,
    CompanionCrashed,
}

impl fmt::Display for HostSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostSignal::CompanionUnresponsive => f.write_str("companion unresponsive"),
            HostSignal::CompanionCrashed => f.write_str("companion crashed"),
        }
    }
}

#[async_trait]
pub trait HostEscalation: Clone + Send + Sync + 'static {
    async fn on_companion_unresponsive(&self);

    async fn on_companion_crashed(&self);
}
