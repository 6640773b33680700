// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last observed lifecycle stage per session.
//!
//! The store exists only to bring a freshly (re)connected companion up to
//! date. It keeps one stage per live session plus the most recent switch, and
//! produces a replay sequence from an owned snapshot so that replay never
//! observes concurrent mutation.

use crate::session::{LifecycleEvent, LifecycleStage, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The most recent switch reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    pub current: SessionId,
    pub previous: Option<SessionId>,
}

/// In-memory map of the latest lifecycle stage per session.
#[derive(Debug, Clone, Default)]
pub struct LifecycleStore {
    stages: BTreeMap<SessionId, LifecycleStage>,
    last_switch: Option<SwitchRecord>,
}

impl LifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lifecycle event.
    ///
    /// Terminal stages remove the session; every other stage replaces the
    /// previous one. A switch also makes the target the current session,
    /// until that session stops.
    pub fn record(&mut self, event: &LifecycleEvent) {
        if event.stage.is_terminal() {
            self.stages.remove(&event.session);
            if self.current_session() == Some(event.session) {
                self.last_switch = None;
            }
            return;
        }
        if event.stage == LifecycleStage::Switching {
            self.last_switch = Some(SwitchRecord {
                current: event.session,
                previous: event.previous,
            });
        }
        self.stages.insert(event.session, event.stage);
    }

    /// Latest stage recorded for a session.
    pub fn stage(&self, session: SessionId) -> Option<LifecycleStage> {
        self.stages.get(&session).copied()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.last_switch.map(|s| s.current)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Point-in-time copy for replay.
    pub fn snapshot(&self) -> LifecycleSnapshot {
        LifecycleSnapshot {
            stages: self.stages.clone(),
            last_switch: self.last_switch,
        }
    }
}

/// Owned copy of the lifecycle store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleSnapshot {
    stages: BTreeMap<SessionId, LifecycleStage>,
    last_switch: Option<SwitchRecord>,
}

impl LifecycleSnapshot {
    pub fn stage(&self, session: SessionId) -> Option<LifecycleStage> {
        self.stages.get(&session).copied()
    }

    pub fn set_stage(&mut self, session: SessionId, stage: LifecycleStage) {
        self.stages.insert(session, stage);
    }

    /// Events that re-create the recorded state on a new companion.
    ///
    /// Order: system session, then the current session, then every other
    /// session in ascending id order. Each session replays the stage
    /// thresholds it has crossed; only the current session gets a switch.
    pub fn replay_events(&self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        let current = self.last_switch.map(|s| s.current);

        self.replay_session(SessionId::SYSTEM, &mut events);
        if let Some(current) = current.filter(|c| !c.is_system()) {
            self.replay_session(current, &mut events);
        }
        for &session in self.stages.keys() {
            if session.is_system() || Some(session) == current {
                continue;
            }
            self.replay_session(session, &mut events);
        }
        events
    }

    fn replay_session(&self, session: SessionId, events: &mut Vec<LifecycleEvent>) {
        let Some(stage) = self.stage(session) else {
            return;
        };
        events.push(LifecycleEvent::new(LifecycleStage::Starting, session));
        if let Some(switch) = self.last_switch.filter(|s| s.current == session) {
            events.push(LifecycleEvent::switching(switch.previous, session));
        }
        if stage >= LifecycleStage::Unlocking {
            events.push(LifecycleEvent::new(LifecycleStage::Unlocking, session));
        }
        if stage >= LifecycleStage::Unlocked {
            events.push(LifecycleEvent::new(LifecycleStage::Unlocked, session));
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
