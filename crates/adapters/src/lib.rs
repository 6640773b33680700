// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod host;
pub mod monitor;
pub mod process;
pub mod subprocess;
pub mod traced;
pub mod transport;
pub mod wire;

pub use host::{ChannelHost, HostEscalation, HostSignal};
pub use monitor::{MonitorError, MonitorFrame, NoOpMonitor, SocketMonitor, WatchdogMonitor};
pub use process::{ProcessError, ProcessIntrospector, ProcfsConfig, ProcfsIntrospector};
pub use traced::{TracedIntrospector, TracedTransport};
pub use transport::{CompanionFrame, HostFrame, Transport, TransportError, UnixSocketTransport};
pub use wire::WireError;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use host::FakeHost;
#[cfg(any(test, feature = "test-support"))]
pub use monitor::FakeMonitor;
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeIntrospector, FakeProcess, ProcessCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, TransportCall};
