// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifiers and lifecycle stages.
//!
//! A session is a logical login context on the host. The host reports each
//! session's progress through an ordered set of lifecycle stages, and the
//! companion must observe the same progression after every reconnect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logical session (a user on the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i32);

impl SessionId {
    /// The system session. Always replayed first.
    pub const SYSTEM: SessionId = SessionId(0);

    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SessionId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Lifecycle stage of a session, in the order a session progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Starting,
    Switching,
    Unlocking,
    Unlocked,
    Stopping,
    Stopped,
}

impl LifecycleStage {
    /// Stopping and stopped drop the session from the lifecycle store.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleStage::Stopping | LifecycleStage::Stopped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleStage::Starting => "starting",
            LifecycleStage::Switching => "switching",
            LifecycleStage::Unlocking => "unlocking",
            LifecycleStage::Unlocked => "unlocked",
            LifecycleStage::Stopping => "stopping",
            LifecycleStage::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle transition reported by the host.
///
/// `previous` is only meaningful for [`LifecycleStage::Switching`], where it
/// names the session being switched away from (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub stage: LifecycleStage,
    pub session: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<SessionId>,
}

impl LifecycleEvent {
    pub fn new(stage: LifecycleStage, session: SessionId) -> Self {
        Self {
            stage,
            session,
            previous: None,
        }
    }

    pub fn switching(previous: Option<SessionId>, session: SessionId) -> Self {
        Self {
            stage: LifecycleStage::Switching,
            session,
            previous,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous {
            Some(prev) => write!(f, "{}({} -> {})", self.stage, prev, self.session),
            None => write!(f, "{}({})", self.stage, self.session),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
