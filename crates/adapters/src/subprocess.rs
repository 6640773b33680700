// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for stack dump commands.
pub const DUMP_COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

/// Default timeout for kill commands.
pub const KILL_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a subprocess command with a timeout.
///
/// The child process is killed if the timeout elapses (via the tokio `Child`
/// drop implementation, enabled with `kill_on_drop`).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Run a configured argv with extra trailing arguments.
///
/// A non-zero exit status is an error, with stderr included in the message.
pub async fn run_argv(
    argv: &[String],
    extra_args: &[String],
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    let Some((program, args)) = argv.split_first() else {
        return Err(format!("{} failed: empty command", description));
    };
    let mut cmd = Command::new(program);
    cmd.args(args).args(extra_args);

    let output = run_with_timeout(cmd, timeout, description).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            description,
            output.status,
            stderr.trim()
        ));
    }
    Ok(output)
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
