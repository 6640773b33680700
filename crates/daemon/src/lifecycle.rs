// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, escalation.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::Mutex;
use tether_adapters::{
    ChannelHost, HostSignal, MonitorError, NoOpMonitor, ProcfsIntrospector, SocketMonitor,
    TracedIntrospector, TracedTransport, UnixSocketTransport, WatchdogMonitor,
};
use tether_core::{Event, SystemClock, TerminationOutcome};
use tether_engine::{Runtime, RuntimeDeps, RuntimeStatus};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::env;
use crate::settings::{ConfigError, Settings};

/// Exit status asking the service manager to restart the host
pub const RESTART_EXIT_CODE: i32 = 10;

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Daemon runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<
    TracedTransport<UnixSocketTransport>,
    ChannelHost,
    TracedIntrospector<ProcfsIntrospector>,
    DaemonMonitor,
    SystemClock,
>;

/// Monitor selected by `monitor_socket`
#[derive(Clone)]
pub enum DaemonMonitor {
    Socket(SocketMonitor),
    Disabled(NoOpMonitor),
}

impl DaemonMonitor {
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.monitor_socket {
            Some(path) => DaemonMonitor::Socket(SocketMonitor::new(path)),
            None => DaemonMonitor::Disabled(NoOpMonitor::new()),
        }
    }
}

#[async_trait]
impl WatchdogMonitor for DaemonMonitor {
    async fn report_termination(&self, outcome: &TerminationOutcome) -> Result<(), MonitorError> {
        match self {
            DaemonMonitor::Socket(monitor) => monitor.report_termination(outcome).await,
            DaemonMonitor::Disabled(monitor) => monitor.report_termination(outcome).await,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/tether)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub config_path: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the resolved state directory.
    pub fn load() -> Result<Self, LifecycleError> {
        Self::load_from(env::state_dir()?)
    }

    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let config_path = state_dir.join("config.toml");
        let settings = Settings::load(&config_path)?;
        Ok(Self {
            socket_path: state_dir.join("tetherd.sock"),
            lock_path: state_dir.join("tetherd.pid"),
            log_path: state_dir.join("tetherd.log"),
            config_path,
            settings,
            state_dir,
        })
    }

    pub fn companion_socket(&self) -> PathBuf {
        self.settings
            .companion_socket
            .clone()
            .unwrap_or_else(|| self.state_dir.join("companion.sock"))
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a Listener task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: DaemonRuntime,
    /// Last published runtime status (shared with the listener)
    pub status: Arc<Mutex<RuntimeStatus>>,
    /// Sender for the engine loop, cloned into the listener
    pub event_tx: mpsc::Sender<Event>,
    pub start_time: Instant,
}

/// Result of daemon startup
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
    /// Events for the engine loop, from the listener and the transport
    pub event_rx: mpsc::Receiver<Event>,
    /// Escalations raised by the supervisor
    pub host_rx: mpsc::UnboundedReceiver<HostSignal>,
}

impl DaemonState {
    /// Process an event through the runtime and publish the new status.
    pub async fn process_event(&mut self, event: Event) {
        self.runtime.handle_event(event).await;
        self.publish_status();
    }

    /// Fire due timers.
    pub async fn check_timers(&mut self) {
        self.runtime.check_timers().await;
        self.publish_status();
    }

    /// When the next supervisor timer is due.
    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.runtime.next_deadline()
    }

    fn publish_status(&self) {
        *self.status.lock() = self.runtime.status();
    }

    /// Exit status for an escalation, or `None` to keep running.
    pub fn exit_code_for(&self, signal: HostSignal) -> Option<i32> {
        exit_code_for(signal, self.config.settings.restart_on_crash)
    }

    /// Shutdown the daemon gracefully.
    pub async fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        // 1. Drop the companion connection
        self.runtime.handle_event(Event::Shutdown).await;

        // 2. Let in-flight terminations report
        let terminator = self.runtime.terminator().clone();
        if terminator.in_flight() > 0 {
            info!(in_flight = terminator.in_flight(), "waiting for terminations");
            terminator.wait_idle().await;
        }

        // 3. Remove socket file (listener task stops when tokio runtime exits)
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 4. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 5. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
    }
}

pub(crate) fn exit_code_for(signal: HostSignal, restart_on_crash: bool) -> Option<i32> {
    match signal {
        HostSignal::CompanionUnresponsive => Some(RESTART_EXIT_CODE),
        HostSignal::CompanionCrashed if restart_on_crash => Some(RESTART_EXIT_CODE),
        HostSignal::CompanionCrashed => None,
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Those files belong to the running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    use std::io::Write;

    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST. Opened without truncation so a running
    // daemon's PID survives until we hold the lock.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Wire adapters
    let settings = &config.settings;
    let (event_tx, event_rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAPACITY);
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let companion_socket = config.companion_socket();
    info!(companion = %companion_socket.display(), "companion socket");

    let runtime = Runtime::new(
        RuntimeDeps {
            transport: TracedTransport::new(
                UnixSocketTransport::new(companion_socket)
                    .with_call_timeout(settings.call_timeout()),
            ),
            host: ChannelHost::new(host_tx),
            introspector: TracedIntrospector::new(ProcfsIntrospector::new(
                settings.procfs_config(),
            )),
            monitor: DaemonMonitor::from_settings(settings),
        },
        SystemClock,
        settings.runtime_config(),
        event_tx.clone(),
    );
    let status = Arc::new(Mutex::new(runtime.status()));

    // 4. Remove stale socket and bind (LAST)
    let listener = bind_socket(&config.socket_path)?;

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            runtime,
            status,
            event_tx,
            start_time: Instant::now(),
        },
        listener,
        event_rx,
        host_rx,
    })
}

fn bind_socket(path: &Path) -> Result<UnixListener, LifecycleError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    UnixListener::bind(path).map_err(|e| LifecycleError::BindFailed(path.to_path_buf(), e))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
