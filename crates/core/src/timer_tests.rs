// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn timer_id_display() {
    let id = TimerId::new("test-timer");
    assert_eq!(id.to_string(), "test-timer");
}

#[test]
fn timer_id_serde() {
    let id = TimerId::handshake();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"handshake\"");

    let parsed: TimerId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[yare::parameterized(
    handshake = { TimerId::handshake(), true, false },
    reconnect = { TimerId::reconnect(), false, true },
    other     = { TimerId::new("other"), false, false },
)]
fn timer_kind(id: TimerId, handshake: bool, reconnect: bool) {
    assert_eq!(id.is_handshake(), handshake);
    assert_eq!(id.is_reconnect(), reconnect);
}
