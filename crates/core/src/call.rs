// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-way calls delivered to the companion.

use crate::pending::{PendingOp, ResetRequest};
use crate::session::{LifecycleEvent, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle the companion hands back when it completes its handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteHandle(pub String);

impl RemoteHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fire-and-forget call to the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CompanionCall {
    InitBootSession,
    SessionRemoved { session: SessionId },
    FactoryReset { request: ResetRequest },
    Lifecycle { event: LifecycleEvent },
}

impl CompanionCall {
    pub fn name(&self) -> &'static str {
        match self {
            CompanionCall::InitBootSession => "init_boot_session",
            CompanionCall::SessionRemoved { .. } => "session_removed",
            CompanionCall::FactoryReset { .. } => "factory_reset",
            CompanionCall::Lifecycle { .. } => "lifecycle",
        }
    }
}

impl From<PendingOp> for CompanionCall {
    fn from(op: PendingOp) -> Self {
        match op {
            PendingOp::InitBootSession => CompanionCall::InitBootSession,
            PendingOp::RemoveSession { session } => CompanionCall::SessionRemoved { session },
            PendingOp::FactoryReset { request } => CompanionCall::FactoryReset { request },
        }
    }
}

impl From<LifecycleEvent> for CompanionCall {
    fn from(event: LifecycleEvent) -> Self {
        CompanionCall::Lifecycle { event }
    }
}

impl fmt::Display for CompanionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanionCall::SessionRemoved { session } => write!(f, "session_removed({session})"),
            CompanionCall::FactoryReset { request } => {
                write!(f, "factory_reset(callback: {})", request.callback_id)
            }
            CompanionCall::Lifecycle { event } => write!(f, "lifecycle:{event}"),
            CompanionCall::InitBootSession => f.write_str(self.name()),
        }
    }
}
