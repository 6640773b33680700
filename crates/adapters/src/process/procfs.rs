// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection backed by a procfs tree and external commands.

use super::{ProcessError, ProcessIntrospector};
use crate::subprocess::{run_argv, DUMP_COMMAND_TIMEOUT, KILL_COMMAND_TIMEOUT};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tether_core::{ProcessInfo, UNKNOWN_PROCESS};

/// `/proc/<pid>/stat`: pid, (comm), state, 18 numeric fields, then starttime
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static STAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pid>[0-9]+)\s\((?P<name>.*)\)\s\S\s(?:-?[0-9]+\s){18}(?P<start>[0-9]+)")
        .expect("constant regex pattern is valid")
});

/// Settings for [`ProcfsIntrospector`]
#[derive(Debug, Clone)]
pub struct ProcfsConfig {
    pub proc_root: PathBuf,
    /// Executable paths that identify managed-runtime processes
    pub managed_executables: Vec<PathBuf>,
    /// Commands whose processes are dumped alongside every client
    pub interesting_commands: Vec<String>,
    /// Dump command argv; `--managed=<pids>` and `--native=<pids>` are appended.
    /// Empty disables dumping.
    pub dump_command: Vec<String>,
    /// Kill command argv; the pid is appended.
    pub kill_command: Vec<String>,
    pub dump_timeout: Duration,
    pub kill_timeout: Duration,
    pub clock_ticks_per_sec: u64,
}

impl Default for ProcfsConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            managed_executables: vec![
                PathBuf::from("/system/bin/app_process32"),
                PathBuf::from("/system/bin/app_process64"),
            ],
            interesting_commands: Vec::new(),
            dump_command: Vec::new(),
            kill_command: vec!["kill".to_string(), "-9".to_string()],
            dump_timeout: DUMP_COMMAND_TIMEOUT,
            kill_timeout: KILL_COMMAND_TIMEOUT,
            clock_ticks_per_sec: 100,
        }
    }
}

/// Reads `stat`, `exe` and `cmdline` under the configured proc root.
#[derive(Debug, Clone)]
pub struct ProcfsIntrospector {
    config: ProcfsConfig,
}

impl ProcfsIntrospector {
    pub fn new(config: ProcfsConfig) -> Self {
        Self { config }
    }

    fn pid_path(&self, pid: u32, file: &str) -> PathBuf {
        self.config.proc_root.join(pid.to_string()).join(file)
    }

    async fn read_file(&self, pid: u32, file: &str) -> Result<String, ProcessError> {
        let path = self.pid_path(pid, file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ProcessError::NotFound(pid)),
            Err(source) => Err(ProcessError::Read { path, source }),
        }
    }

    /// First argument of the command line, if any.
    async fn argv0(&self, pid: u32) -> Option<String> {
        let cmdline = self.read_file(pid, "cmdline").await.ok()?;
        cmdline
            .split('\0')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn parse_stat(&self, pid: u32, line: &str) -> Result<ProcessInfo, ProcessError> {
        let malformed = || ProcessError::MalformedStat {
            pid,
            line: line.trim().to_string(),
        };
        let caps = STAT_PATTERN.captures(line.trim()).ok_or_else(malformed)?;
        let read_pid: u32 = caps["pid"].parse().map_err(|_| malformed())?;
        if read_pid != pid {
            return Err(malformed());
        }
        let ticks: u64 = caps["start"].parse().map_err(|_| malformed())?;
        let start_time_ms = ticks
            .saturating_mul(1000)
            .checked_div(self.config.clock_ticks_per_sec);
        Ok(ProcessInfo {
            pid,
            name: caps["name"].to_string(),
            start_time_ms,
        })
    }
}

fn command_matches(argv0: &str, command: &str) -> bool {
    argv0 == command || Path::new(argv0).file_name().is_some_and(|name| name == command)
}

fn join_pids(pids: &[u32]) -> String {
    pids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl ProcessIntrospector for ProcfsIntrospector {
    async fn interesting_native_pids(&self) -> Vec<u32> {
        if self.config.interesting_commands.is_empty() {
            return Vec::new();
        }
        let mut entries = match tokio::fs::read_dir(&self.config.proc_root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(root = %self.config.proc_root.display(), error = %e, "cannot list processes");
                return Vec::new();
            }
        };

        let mut pids = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            let Some(argv0) = self.argv0(pid).await else {
                continue;
            };
            if self
                .config
                .interesting_commands
                .iter()
                .any(|cmd| command_matches(&argv0, cmd))
            {
                pids.push(pid);
            }
        }
        pids.sort_unstable();
        pids
    }

    async fn process_info(&self, pid: u32) -> Result<ProcessInfo, ProcessError> {
        let line = self.read_file(pid, "stat").await?;
        self.parse_stat(pid, &line)
    }

    async fn process_name(&self, pid: u32) -> String {
        self.argv0(pid)
            .await
            .and_then(|argv0| {
                let first = argv0.split(' ').next().unwrap_or(&argv0).to_string();
                Path::new(&first)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| UNKNOWN_PROCESS.to_string())
    }

    async fn is_managed_process(&self, pid: u32) -> Result<bool, ProcessError> {
        let path = self.pid_path(pid, "exe");
        let target = match tokio::fs::read_link(&path).await {
            Ok(target) => target,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProcessError::NotFound(pid))
            }
            Err(source) => return Err(ProcessError::Read { path, source }),
        };
        Ok(self.config.managed_executables.contains(&target))
    }

    async fn capture_stack_dump(
        &self,
        managed: &[u32],
        native: &[u32],
    ) -> Result<(), ProcessError> {
        if self.config.dump_command.is_empty() {
            tracing::debug!("no dump command configured, skipping stack dump");
            return Ok(());
        }
        let args = vec![
            format!("--managed={}", join_pids(managed)),
            format!("--native={}", join_pids(native)),
        ];
        run_argv(
            &self.config.dump_command,
            &args,
            self.config.dump_timeout,
            "stack dump",
        )
        .await
        .map(|_| ())
        .map_err(ProcessError::DumpFailed)
    }

    async fn kill_process(&self, pid: u32) -> Result<(), ProcessError> {
        run_argv(
            &self.config.kill_command,
            &[pid.to_string()],
            self.config.kill_timeout,
            "kill",
        )
        .await
        .map(|_| ())
        .map_err(|message| ProcessError::KillFailed { pid, message })
    }
}

#[cfg(test)]
#[path = "procfs_tests.rs"]
mod tests;
