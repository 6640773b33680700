// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::{LifecycleStage, SessionId};

#[test]
fn event_serializes_with_type_tag() {
    let event = Event::Lifecycle {
        event: LifecycleEvent::new(LifecycleStage::Unlocked, SessionId(10)),
    };
    let json: serde_json::Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "host:lifecycle");
    assert_eq!(json["event"]["stage"], "unlocked");
    assert_eq!(json["event"]["session"], 10);
}

#[test]
fn event_name_matches_serde_tag() {
    let events = vec![
        Event::Submit {
            op: PendingOp::InitBootSession,
        },
        Event::ClearReset,
        Event::ConnectRequested,
        Event::HandshakeCompleted {
            handle: RemoteHandle::new("h1"),
        },
        Event::HandshakeFailed {
            reason: "null handle".to_string(),
        },
        Event::Disconnected,
        Event::ClientsNotResponding {
            processes: vec![ProcessIdentifier::new(100)],
        },
        Event::TimerStart {
            id: TimerId::handshake(),
        },
        Event::Shutdown,
    ];
    for event in events {
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
