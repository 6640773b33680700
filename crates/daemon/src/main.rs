// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tether Daemon (tetherd)
//!
//! Keeps the host's link to the companion process alive and terminates
//! clients the watchdog reports as unresponsive.
//!
//! Architecture:
//! - Listener Task: Spawned task handling socket I/O, forwards events
//! - Engine Loop: Main task processing events sequentially

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;
mod protocol;
mod settings;

use std::sync::Arc;
use std::time::Duration;

use tether_core::Event;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::Listener;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tetherd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("tetherd {VERSION}");
                println!("Tether Daemon - supervises the companion link and the process watchdog");
                println!();
                println!("USAGE:");
                println!("    tetherd");
                println!();
                println!("State lives in $TETHER_STATE_DIR (default ~/.local/state/tether).");
                println!("Settings are read from config.toml in that directory.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: tetherd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!(settings = %config.config_path.display(), "Starting daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
        mut event_rx,
        mut host_rx,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("tetherd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());

    let listener = Listener::new(
        unix_listener,
        daemon.event_tx.clone(),
        Arc::clone(&daemon.status),
        Arc::clone(&shutdown_notify),
    );
    tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process
    println!("READY");

    // Reach for the companion right away
    daemon.process_event(Event::ConnectRequested).await;

    // NOTE: Must be created outside the loop - tokio::select! re-evaluates
    // branches on each iteration, so a sleep() inside would reset on every
    // event and timers would never fire during activity.
    let mut timer_check = tokio::time::interval(timer_check_interval(&config));

    let mut exit_code = None;
    loop {
        // Absolute deadline, so rebuilding the sleep each pass does not delay it.
        let deadline = daemon.next_deadline();
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => daemon.process_event(event).await,
                    None => {
                        info!("Event channel closed, shutting down...");
                        break;
                    }
                }
            }

            Some(host_signal) = host_rx.recv() => {
                warn!(signal = %host_signal, "companion escalation");
                if let Some(code) = daemon.exit_code_for(host_signal) {
                    error!(signal = %host_signal, code, "exiting for restart");
                    exit_code = Some(code);
                    break;
                }
            }

            _ = shutdown_notify.notified() => {
                info!("Shutdown requested via command");
                break;
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }

            _ = sigusr1.recv() => {
                match serde_json::to_string(&daemon.runtime.status()) {
                    Ok(json) => info!(
                        uptime_secs = daemon.start_time.elapsed().as_secs(),
                        status = %json,
                        "status dump"
                    ),
                    Err(e) => warn!("Failed to serialize status: {}", e),
                }
            }

            _ = sleep_until_deadline(deadline) => {
                daemon.check_timers().await;
            }

            _ = timer_check.tick() => {
                daemon.check_timers().await;
            }
        }
    }

    daemon.shutdown().await;
    info!("Daemon stopped");
    drop(log_guard);

    if let Some(code) = exit_code {
        std::process::exit(code);
    }
    Ok(())
}

/// Resolves at `deadline`, or never when no timer is armed.
async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// Timer check interval: env override, then settings
fn timer_check_interval(config: &Config) -> Duration {
    env::timer_check_ms()
        .unwrap_or_else(|| Duration::from_millis(config.settings.timer_check_ms))
        .max(Duration::from_millis(1))
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- tetherd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- tetherd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
