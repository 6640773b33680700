// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake host for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{HostEscalation, HostSignal};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every escalation
#[derive(Clone, Default)]
pub struct FakeHost {
    signals: Arc<Mutex<Vec<HostSignal>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<HostSignal> {
        self.signals.lock().clone()
    }

    pub fn count(&self, signal: HostSignal) -> usize {
        self.signals.lock().iter().filter(|s| **s == signal).count()
    }
}

#[async_trait]
impl HostEscalation for FakeHost {
    async fn on_companion_unresponsive(&self) {
        self.signals.lock().push(HostSignal::CompanionUnresponsive);
    }

    async fn on_companion_crashed(&self) {
        self.signals.lock().push(HostSignal::CompanionCrashed);
    }
}
