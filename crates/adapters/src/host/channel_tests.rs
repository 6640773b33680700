// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn signals_are_forwarded_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let host = ChannelHost::new(tx);

    host.on_companion_crashed().await;
    host.on_companion_unresponsive().await;

    assert_eq!(rx.recv().await, Some(HostSignal::CompanionCrashed));
    assert_eq!(rx.recv().await, Some(HostSignal::CompanionUnresponsive));
}

#[tokio::test]
async fn closed_loop_does_not_panic() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    ChannelHost::new(tx).on_companion_crashed().await;
}
