// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tether_core::ProcessIdentifier;
use tokio::net::UnixListener;

#[tokio::test]
async fn report_is_written_as_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let monitor = SocketMonitor::new(&path);

    let outcome = TerminationOutcome {
        process: ProcessIdentifier::with_start_time(100, 5_000),
        killed: true,
    };
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        wire::read_frame::<MonitorFrame, _>(&mut stream).await.unwrap()
    });

    monitor.report_termination(&outcome).await.unwrap();

    assert_eq!(
        server.await.unwrap(),
        MonitorFrame::TerminationFinished { outcome }
    );
}

#[tokio::test]
async fn missing_socket_fails_report() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = SocketMonitor::new(dir.path().join("absent.sock"));
    let outcome = TerminationOutcome {
        process: ProcessIdentifier::new(100),
        killed: false,
    };

    let err = monitor.report_termination(&outcome).await.unwrap_err();
    assert!(err.to_string().contains("absent.sock"));
}
