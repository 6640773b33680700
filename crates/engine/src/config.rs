// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine timing configuration

use std::time::Duration;

/// How long the companion has to complete its handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Delay before reconnecting after the companion died.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1_000);

/// Time a client gets between its stack dump and its kill.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub handshake_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminatorConfig {
    /// Minimum time from the start of a client's dump to its kill.
    /// A dump that takes longer is followed by an immediate kill.
    pub kill_grace: Duration,
}

impl Default for TerminatorConfig {
    fn default() -> Self {
        Self {
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub supervisor: SupervisorConfig,
    pub terminator: TerminatorConfig,
}
