// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process::{FakeIntrospector, FakeProcess, ProcessCall};
use crate::transport::{FakeTransport, TransportCall};
use serial_test::{parallel, serial};
use std::sync::{Arc, Mutex};
use tether_core::SessionId;
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn assert_log(logs: &str, label: &str, expected: &str) {
    assert!(logs.contains(expected), "Should log {label}. Logs:\n{logs}",);
}

fn removal() -> CompanionCall {
    CompanionCall::SessionRemoved {
        session: SessionId(10),
    }
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
#[serial(tracing)]
fn traced_connect_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedTransport::new(FakeTransport::new());
        let (tx, _rx) = mpsc::channel(1);
        traced.connect(tx).await
    });

    assert!(result.is_ok());
    assert_log(&logs, "span name", "transport.connect");
    assert_log(&logs, "completion", "awaiting handshake");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_connect_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeTransport::new();
        fake.set_connect_error("refused");
        let (tx, _rx) = mpsc::channel(1);
        TracedTransport::new(fake).connect(tx).await
    });

    assert!(result.is_err());
    assert_log(&logs, "connect failure", "connect failed");
}

#[test]
#[serial(tracing)]
fn traced_call_logs_failure_with_call_name() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeTransport::new();
        fake.fail_calls();
        TracedTransport::new(fake)
            .call_one_way(&RemoteHandle::new("h1"), &removal())
            .await
    });

    assert!(result.is_err());
    assert_log(&logs, "span", "transport.call");
    assert_log(&logs, "failure", "call failed");
    assert_log(&logs, "call name", "session_removed");
}

#[test]
#[serial(tracing)]
fn traced_dump_logs_timing() {
    let (logs, _) = with_tracing(|| async {
        TracedIntrospector::new(FakeIntrospector::new())
            .capture_stack_dump(&[100], &[7])
            .await
    });

    assert_log(&logs, "span", "process.dump");
    assert_log(&logs, "completion", "stacks dumped");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_kill_logs_warning_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeIntrospector::new();
        fake.fail_kill(100);
        TracedIntrospector::new(fake).kill_process(100).await
    });

    assert!(result.is_err());
    assert_log(&logs, "span", "process.kill");
    assert_log(&logs, "failure", "kill failed");
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
#[parallel(tracing)]
async fn traced_transport_delegates_calls() {
    let fake = FakeTransport::new();
    let traced = TracedTransport::new(fake.clone());
    let (tx, _rx) = mpsc::channel(1);

    traced.connect(tx).await.unwrap();
    traced
        .call_one_way(&RemoteHandle::new("h1"), &removal())
        .await
        .unwrap();
    traced.disconnect().await;

    assert_eq!(
        fake.calls(),
        vec![
            TransportCall::Connect,
            TransportCall::Call {
                handle: RemoteHandle::new("h1"),
                call: removal(),
            },
            TransportCall::Disconnect,
        ]
    );
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_introspector_delegates_calls() {
    let fake = FakeIntrospector::new();
    fake.add_process(100, FakeProcess::managed("client"));
    fake.set_interesting(vec![7]);
    let traced = TracedIntrospector::new(fake.clone());

    assert_eq!(traced.interesting_native_pids().await, vec![7]);
    assert_eq!(traced.process_name(100).await, "client");
    assert!(traced.is_managed_process(100).await.unwrap());
    assert_eq!(traced.process_info(100).await.unwrap().pid, 100);
    traced.kill_process(100).await.unwrap();

    assert_eq!(fake.calls(), vec![ProcessCall::Kill { pid: 100 }]);
}
