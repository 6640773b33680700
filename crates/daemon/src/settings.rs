// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `config.toml` settings. Every field has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tether_adapters::subprocess::{DUMP_COMMAND_TIMEOUT, KILL_COMMAND_TIMEOUT};
use tether_adapters::transport::DEFAULT_CALL_TIMEOUT;
use tether_adapters::ProcfsConfig;
use tether_engine::{RuntimeConfig, SupervisorConfig, TerminatorConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Companion socket; defaults to `companion.sock` in the state directory
    pub companion_socket: Option<PathBuf>,
    /// Watchdog monitor socket; reports are dropped when unset
    pub monitor_socket: Option<PathBuf>,
    pub handshake_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    pub kill_grace_ms: u64,
    /// Bound on each write to the companion; a stalled write counts as a crash
    pub call_timeout_ms: u64,
    /// Exit with the restart status when the companion crashes
    pub restart_on_crash: bool,
    /// Upper bound on how long a due timer waits to fire
    pub timer_check_ms: u64,
    pub process: ProcessSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            companion_socket: None,
            monitor_socket: None,
            handshake_timeout_ms: 15_000,
            reconnect_delay_ms: 1_000,
            kill_grace_ms: 1_000,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT.as_millis() as u64,
            restart_on_crash: false,
            timer_check_ms: 1_000,
            process: ProcessSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessSettings {
    pub proc_root: PathBuf,
    pub managed_executables: Vec<PathBuf>,
    pub interesting_commands: Vec<String>,
    pub dump_command: Vec<String>,
    pub kill_command: Vec<String>,
    /// Overrides both the dump and kill command timeouts
    pub command_timeout_ms: Option<u64>,
    pub clock_ticks_per_sec: u64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        let procfs = ProcfsConfig::default();
        Self {
            proc_root: procfs.proc_root,
            managed_executables: procfs.managed_executables,
            interesting_commands: procfs.interesting_commands,
            dump_command: procfs.dump_command,
            kill_command: procfs.kill_command,
            command_timeout_ms: None,
            clock_ticks_per_sec: procfs.clock_ticks_per_sec,
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            supervisor: SupervisorConfig {
                handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
                reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            },
            terminator: TerminatorConfig {
                kill_grace: Duration::from_millis(self.kill_grace_ms),
            },
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn procfs_config(&self) -> ProcfsConfig {
        let p = &self.process;
        let timeout = p.command_timeout_ms.map(Duration::from_millis);
        ProcfsConfig {
            proc_root: p.proc_root.clone(),
            managed_executables: p.managed_executables.clone(),
            interesting_commands: p.interesting_commands.clone(),
            dump_command: p.dump_command.clone(),
            kill_command: p.kill_command.clone(),
            dump_timeout: timeout.unwrap_or(DUMP_COMMAND_TIMEOUT),
            kill_timeout: timeout.unwrap_or(KILL_COMMAND_TIMEOUT),
            clock_ticks_per_sec: p.clock_ticks_per_sec,
        }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
