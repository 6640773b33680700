// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{HostEscalation, HostSignal};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Forwards escalations to the daemon loop.
#[derive(Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostSignal>,
}

impl ChannelHost {
    pub fn new(tx: mpsc::UnboundedSender<HostSignal>) -> Self {
        Self { tx }
    }

    fn send(&self, signal: HostSignal) {
        if self.tx.send(signal).is_err() {
            tracing::warn!(%signal, "host loop gone, dropping signal");
        }
    }
}

#[async_trait]
impl HostEscalation for ChannelHost {
    async fn on_companion_unresponsive(&self) {
        self.send(HostSignal::CompanionUnresponsive);
    }

    async fn on_companion_crashed(&self) {
        self.send(HostSignal::CompanionCrashed);
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
