// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations deferred while the companion is unreachable.
//!
//! Each operation kind has its own merge rule:
//! - init: presence only, saving twice is a no-op
//! - remove: session ids accumulate in submission order
//! - reset: the latest request replaces the previous one and survives
//!   successful sends until explicitly cleared

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A factory reset request.
///
/// `callback_id` identifies the host-side receiver awaiting the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResetRequest {
    pub callback_id: u64,
}

/// A state-changing operation destined for the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PendingOp {
    /// Ask the companion to initialize the boot session.
    InitBootSession,
    /// A session was removed from the host.
    RemoveSession { session: SessionId },
    /// A factory reset was requested.
    FactoryReset { request: ResetRequest },
}

impl PendingOp {
    pub fn kind(&self) -> PendingKind {
        match self {
            PendingOp::InitBootSession => PendingKind::Init,
            PendingOp::RemoveSession { .. } => PendingKind::Remove,
            PendingOp::FactoryReset { .. } => PendingKind::Reset,
        }
    }
}

/// Operation kind, one slot per kind in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    Init,
    Remove,
    Reset,
}

impl PendingKind {
    /// Order in which pending operations are flushed on connect.
    ///
    /// Reset goes last since it may be resent even when it is not new.
    pub const FLUSH_ORDER: [PendingKind; 3] =
        [PendingKind::Init, PendingKind::Remove, PendingKind::Reset];

    pub fn name(&self) -> &'static str {
        match self {
            PendingKind::Init => "init",
            PendingKind::Remove => "remove",
            PendingKind::Reset => "reset",
        }
    }
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Merged contents of one slot, as returned by [`PendingStore::take`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Init,
    Remove(Vec<SessionId>),
    Reset(ResetRequest),
}

impl Pending {
    /// Split back into individual operations, preserving order.
    pub fn into_ops(self) -> Vec<PendingOp> {
        match self {
            Pending::Init => vec![PendingOp::InitBootSession],
            Pending::Remove(sessions) => sessions
                .into_iter()
                .map(|session| PendingOp::RemoveSession { session })
                .collect(),
            Pending::Reset(request) => vec![PendingOp::FactoryReset { request }],
        }
    }
}

/// Diagnostic view of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSummary {
    pub init: bool,
    pub removed_sessions: Vec<SessionId>,
    pub reset: Option<ResetRequest>,
}

/// Keyed table of deferred operations.
#[derive(Debug, Clone, Default)]
pub struct PendingStore {
    init: bool,
    removed: Vec<SessionId>,
    reset: Option<ResetRequest>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save an operation using its kind's merge rule.
    pub fn save(&mut self, op: PendingOp) {
        match op {
            PendingOp::InitBootSession => self.init = true,
            PendingOp::RemoveSession { session } => self.removed.push(session),
            PendingOp::FactoryReset { request } => self.reset = Some(request),
        }
    }

    /// Take the merged value for a kind.
    ///
    /// Init and remove slots are cleared. The reset slot is returned by copy
    /// and stays until [`PendingStore::clear_reset`].
    pub fn take(&mut self, kind: PendingKind) -> Option<Pending> {
        match kind {
            PendingKind::Init => std::mem::take(&mut self.init).then_some(Pending::Init),
            PendingKind::Remove => {
                if self.removed.is_empty() {
                    None
                } else {
                    Some(Pending::Remove(std::mem::take(&mut self.removed)))
                }
            }
            PendingKind::Reset => self.reset.map(Pending::Reset),
        }
    }

    /// Put operations back at the front of their slots.
    ///
    /// Used when a flush is interrupted so unsent operations keep their
    /// original order ahead of anything saved since.
    pub fn restore(&mut self, ops: Vec<PendingOp>) {
        let mut removed = Vec::new();
        for op in ops {
            match op {
                PendingOp::RemoveSession { session } => removed.push(session),
                PendingOp::FactoryReset { request } => {
                    // The newest reset always wins
                    if self.reset.is_none() {
                        self.reset = Some(request);
                    }
                }
                PendingOp::InitBootSession => self.init = true,
            }
        }
        removed.append(&mut self.removed);
        self.removed = removed;
    }

    pub fn reset_request(&self) -> Option<ResetRequest> {
        self.reset
    }

    /// Drop the stored reset request.
    pub fn clear_reset(&mut self) -> Option<ResetRequest> {
        self.reset.take()
    }

    pub fn is_empty(&self) -> bool {
        !self.init && self.removed.is_empty() && self.reset.is_none()
    }

    pub fn summary(&self) -> PendingSummary {
        PendingSummary {
            init: self.init,
            removed_sessions: self.removed.clone(),
            reset: self.reset,
        }
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
