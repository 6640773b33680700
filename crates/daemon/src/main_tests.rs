// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serial_test::serial;

use super::{sleep_until_deadline, timer_check_interval, Config};

fn config() -> Config {
    let dir = tempfile::tempdir().unwrap();
    Config::load_from(dir.path().to_path_buf()).unwrap()
}

#[test]
#[serial(env)]
fn timer_check_interval_default() {
    std::env::remove_var("TETHER_TIMER_CHECK_MS");
    assert_eq!(timer_check_interval(&config()), Duration::from_secs(1));
}

#[test]
#[serial(env)]
fn timer_check_interval_from_settings() {
    std::env::remove_var("TETHER_TIMER_CHECK_MS");
    let mut config = config();
    config.settings.timer_check_ms = 250;
    assert_eq!(timer_check_interval(&config), Duration::from_millis(250));
}

#[test]
#[serial(env)]
fn timer_check_interval_env_overrides_settings() {
    std::env::set_var("TETHER_TIMER_CHECK_MS", "500");
    let mut config = config();
    config.settings.timer_check_ms = 250;
    assert_eq!(timer_check_interval(&config), Duration::from_millis(500));
    std::env::remove_var("TETHER_TIMER_CHECK_MS");
}

#[test]
#[serial(env)]
fn timer_check_interval_invalid_env_falls_back() {
    std::env::set_var("TETHER_TIMER_CHECK_MS", "not_a_number");
    assert_eq!(timer_check_interval(&config()), Duration::from_secs(1));
    std::env::remove_var("TETHER_TIMER_CHECK_MS");
}

#[test]
#[serial(env)]
fn zero_interval_is_clamped() {
    std::env::set_var("TETHER_TIMER_CHECK_MS", "0");
    assert_eq!(timer_check_interval(&config()), Duration::from_millis(1));
    std::env::remove_var("TETHER_TIMER_CHECK_MS");
}

#[tokio::test]
async fn deadline_sleep_wakes_at_deadline() {
    let at = std::time::Instant::now() + Duration::from_millis(20);
    tokio::time::timeout(Duration::from_secs(5), sleep_until_deadline(Some(at)))
        .await
        .unwrap();
    assert!(std::time::Instant::now() >= at);
}

#[tokio::test]
async fn deadline_sleep_without_timer_never_wakes() {
    let result =
        tokio::time::timeout(Duration::from_millis(50), sleep_until_deadline(None)).await;
    assert!(result.is_err());
}
