// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_file_yields_defaults() {
    let settings = Settings::parse("").unwrap();
    assert_eq!(settings, Settings::default());

    let runtime = settings.runtime_config();
    assert_eq!(runtime.supervisor.handshake_timeout, Duration::from_secs(15));
    assert_eq!(runtime.supervisor.reconnect_delay, Duration::from_secs(1));
    assert_eq!(runtime.terminator.kill_grace, Duration::from_secs(1));
    assert_eq!(settings.call_timeout(), Duration::from_secs(2));
}

#[test]
fn overrides_are_applied() {
    let settings = Settings::parse(
        r#"
companion_socket = "/run/companion.sock"
handshake_timeout_ms = 500
call_timeout_ms = 250
restart_on_crash = true

[process]
proc_root = "/tmp/proc"
interesting_commands = ["/system/bin/surfaceflinger"]
dump_command = ["debuggerd", "-b"]
command_timeout_ms = 3000
"#,
    )
    .unwrap();

    assert_eq!(
        settings.companion_socket,
        Some(PathBuf::from("/run/companion.sock"))
    );
    assert!(settings.restart_on_crash);
    assert_eq!(
        settings.runtime_config().supervisor.handshake_timeout,
        Duration::from_millis(500)
    );
    assert_eq!(settings.call_timeout(), Duration::from_millis(250));

    let procfs = settings.procfs_config();
    assert_eq!(procfs.proc_root, PathBuf::from("/tmp/proc"));
    assert_eq!(procfs.dump_command, vec!["debuggerd", "-b"]);
    assert_eq!(procfs.dump_timeout, Duration::from_secs(3));
    assert_eq!(procfs.kill_timeout, Duration::from_secs(3));
    // Untouched fields keep their defaults
    assert_eq!(procfs.kill_command, vec!["kill", "-9"]);
    assert_eq!(procfs.clock_ticks_per_sec, 100);
}

#[yare::parameterized(
    unknown_key  = { "handshake_timeout = 5" },
    wrong_type   = { "kill_grace_ms = \"soon\"" },
    bad_table    = { "[process]\nproc_root = 7" },
)]
fn invalid_settings_are_rejected(text: &str) {
    assert!(Settings::parse(text).is_err());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn parse_error_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "restart_on_crash = maybe").unwrap();

    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}
