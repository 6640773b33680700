// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tether engine: companion connection supervision and process termination

mod config;
mod runtime;
mod scheduler;
mod supervisor;
mod terminator;

pub use config::{RuntimeConfig, SupervisorConfig, TerminatorConfig};
pub use runtime::{Runtime, RuntimeDeps, RuntimeStatus};
pub use scheduler::Scheduler;
pub use supervisor::{ConnectionSupervisor, SupervisorStatus};
pub use terminator::{ProcessTerminator, TerminatorStatus};
