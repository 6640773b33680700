// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tether-core: domain types for the companion connection supervisor

pub mod call;
pub mod clock;
pub mod connection;
pub mod event;
pub mod lifecycle;
pub mod pending;
pub mod process;
pub mod session;
pub mod timer;

pub use call::{CompanionCall, RemoteHandle};
pub use clock::{Clock, FakeClock, SystemClock};
pub use connection::ConnectionState;
pub use event::Event;
pub use lifecycle::{LifecycleSnapshot, LifecycleStore, SwitchRecord};
pub use pending::{Pending, PendingKind, PendingOp, PendingStore, PendingSummary, ResetRequest};
pub use process::{ProcessIdentifier, ProcessInfo, ProcessKind, TerminationOutcome, UNKNOWN_PROCESS};
pub use session::{LifecycleEvent, LifecycleStage, SessionId};
pub use timer::TimerId;
