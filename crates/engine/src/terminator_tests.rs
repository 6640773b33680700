// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tether_adapters::{FakeIntrospector, FakeMonitor, FakeProcess, ProcessCall};

type TestTerminator = ProcessTerminator<FakeIntrospector, FakeMonitor>;

fn setup() -> (FakeIntrospector, FakeMonitor, TestTerminator) {
    let introspector = FakeIntrospector::new();
    let monitor = FakeMonitor::new();
    let terminator = ProcessTerminator::new(
        introspector.clone(),
        monitor.clone(),
        TerminatorConfig::default(),
    );
    (introspector, monitor, terminator)
}

fn ids(pids: &[u32]) -> Vec<ProcessIdentifier> {
    pids.iter().map(|pid| ProcessIdentifier::new(*pid)).collect()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =============================================================================
// Timing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn kill_waits_out_grace_measured_from_dump_start() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client_a"));
    fake.add_process(200, FakeProcess::native("client_b"));
    fake.set_dump_delay(ms(200));
    let start = Instant::now();

    terminator.request_terminate(ids(&[100, 200]));
    terminator.wait_idle().await;

    // Dump of 100 ends at 200ms, so its kill comes 800ms later
    let at_100 = monitor.reported_at(100).unwrap() - start;
    let at_200 = monitor.reported_at(200).unwrap() - start;
    assert!(at_100 >= ms(1_000), "killed too early: {at_100:?}");
    assert!(at_100 < ms(1_100), "killed too late: {at_100:?}");
    assert!(at_200 >= ms(1_200), "killed too early: {at_200:?}");
    assert!(at_100 < at_200);
    assert_eq!(fake.killed(), vec![100, 200]);
}

#[tokio::test(start_paused = true)]
async fn slow_dump_kills_immediately() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client"));
    fake.set_dump_delay(ms(1_500));
    let start = Instant::now();

    terminator.request_terminate(ids(&[100]));
    terminator.wait_idle().await;

    let at = monitor.reported_at(100).unwrap() - start;
    assert!(at >= ms(1_500));
    assert!(at < ms(1_600), "kill was delayed after a slow dump: {at:?}");
}

#[tokio::test(start_paused = true)]
async fn report_for_one_process_is_independent_of_another() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client_a"));
    fake.add_process(200, FakeProcess::native("client_b"));
    fake.fail_kill(200);
    fake.set_dump_delay(ms(200));

    terminator.request_terminate(ids(&[100, 200]));
    terminator.wait_idle().await;

    assert_eq!(
        monitor.reports(),
        vec![
            TerminationOutcome {
                process: ProcessIdentifier::new(100),
                killed: true
            },
            TerminationOutcome {
                process: ProcessIdentifier::new(200),
                killed: false
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn monitor_failure_does_not_stall_batch() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client"));
    monitor.fail_reports();

    terminator.request_terminate(ids(&[100]));
    terminator.wait_idle().await;

    assert_eq!(fake.killed(), vec![100]);
    assert_eq!(terminator.in_flight(), 0);
}

// =============================================================================
// Worker lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_batches_share_one_worker() {
    let (fake, _monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client_a"));
    fake.add_process(200, FakeProcess::managed("client_b"));

    terminator.request_terminate(ids(&[100]));
    terminator.request_terminate(ids(&[200]));
    assert_eq!(terminator.workers_spawned(), 1);
    assert_eq!(terminator.in_flight(), 2);
    assert!(terminator.has_worker());

    terminator.wait_idle().await;

    assert_eq!(terminator.in_flight(), 0);
    assert!(!terminator.has_worker());
    assert_eq!(fake.killed(), vec![100, 200]);
}

#[tokio::test(start_paused = true)]
async fn new_worker_after_previous_retired() {
    let (fake, _monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client_a"));
    fake.add_process(200, FakeProcess::managed("client_b"));

    terminator.request_terminate(ids(&[100]));
    terminator.wait_idle().await;
    terminator.request_terminate(ids(&[200]));
    terminator.wait_idle().await;

    assert_eq!(terminator.workers_spawned(), 2);
    assert_eq!(
        terminator.status(),
        TerminatorStatus {
            in_flight: 0,
            has_worker: false,
            workers_spawned: 2
        }
    );
}

#[tokio::test]
async fn empty_batch_is_ignored() {
    let (_fake, _monitor, terminator) = setup();
    terminator.request_terminate(Vec::new());

    assert_eq!(terminator.workers_spawned(), 0);
    assert_eq!(terminator.in_flight(), 0);
    terminator.wait_idle().await;
}

// =============================================================================
// Per-process handling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn reused_pid_is_skipped() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("newcomer").started_at(9_000));

    terminator.request_terminate(vec![ProcessIdentifier::with_start_time(100, 5_000)]);
    terminator.wait_idle().await;

    assert!(fake.calls().is_empty());
    assert!(monitor.reports().is_empty());
    assert!(fake.is_alive(100));
}

#[tokio::test(start_paused = true)]
async fn missing_process_is_skipped_others_proceed() {
    let (fake, _monitor, terminator) = setup();
    fake.add_process(200, FakeProcess::native("client"));

    terminator.request_terminate(ids(&[100, 200]));
    terminator.wait_idle().await;

    assert_eq!(fake.killed(), vec![200]);
}

#[tokio::test(start_paused = true)]
async fn dump_includes_interesting_native_pids() {
    let (fake, _monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client_a"));
    fake.add_process(200, FakeProcess::native("client_b"));
    fake.set_interesting(vec![7, 200]);

    terminator.request_terminate(ids(&[100, 200]));
    terminator.wait_idle().await;

    let dumps: Vec<ProcessCall> = fake
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ProcessCall::Dump { .. }))
        .collect();
    assert_eq!(
        dumps,
        vec![
            ProcessCall::Dump {
                managed: vec![100],
                native: vec![7, 200]
            },
            ProcessCall::Dump {
                managed: vec![],
                native: vec![200, 7]
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_dump_still_kills() {
    let (fake, _monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client"));
    fake.fail_dumps();

    terminator.request_terminate(ids(&[100]));
    terminator.wait_idle().await;

    assert_eq!(fake.killed(), vec![100]);
}

#[tokio::test(start_paused = true)]
async fn process_exiting_during_grace_is_reported_not_killed() {
    let (fake, monitor, terminator) = setup();
    fake.add_process(100, FakeProcess::managed("client"));

    terminator.request_terminate(ids(&[100]));
    tokio::time::sleep(ms(500)).await;
    fake.exit_process(100);
    terminator.wait_idle().await;

    assert!(fake.killed().is_empty());
    assert_eq!(
        monitor.reports(),
        vec![TerminationOutcome {
            process: ProcessIdentifier::new(100),
            killed: false
        }]
    );
}

#[yare::parameterized(
    managed_client = { ProcessKind::Managed, vec![7, 8], vec![100], vec![7, 8] },
    native_client  = { ProcessKind::Native, vec![7], vec![], vec![100, 7] },
    native_dedup   = { ProcessKind::Native, vec![100, 7, 7], vec![], vec![100, 7] },
    no_interesting = { ProcessKind::Managed, vec![], vec![100], vec![] },
)]
fn dump_target_lists(kind: ProcessKind, interesting: Vec<u32>, managed: Vec<u32>, native: Vec<u32>) {
    assert_eq!(dump_targets(100, kind, interesting), (managed, native));
}
