// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::path::PathBuf;
use tempfile::TempDir;
use tether_adapters::wire;
use tether_core::{
    ConnectionState, PendingOp, PendingSummary, ProcessIdentifier, SessionId,
};
use tether_engine::{SupervisorStatus, TerminatorStatus};

struct Harness {
    _dir: TempDir,
    path: PathBuf,
    event_rx: mpsc::Receiver<Event>,
    status: Arc<Mutex<RuntimeStatus>>,
    shutdown: Arc<Notify>,
}

fn idle_status() -> RuntimeStatus {
    RuntimeStatus {
        supervisor: SupervisorStatus {
            state: ConnectionState::Disconnected,
            pending: PendingSummary::default(),
            tracked_sessions: 0,
            current_session: None,
            flush_count: 0,
            handshake_armed: false,
            reconnect_armed: false,
        },
        terminator: TerminatorStatus::default(),
    }
}

fn spawn_listener() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tetherd.sock");
    let socket = UnixListener::bind(&path).unwrap();
    let (event_tx, event_rx) = mpsc::channel(16);
    let status = Arc::new(Mutex::new(idle_status()));
    let shutdown = Arc::new(Notify::new());

    let listener = Listener::new(socket, event_tx, Arc::clone(&status), Arc::clone(&shutdown));
    tokio::spawn(listener.run());

    Harness {
        _dir: dir,
        path,
        event_rx,
        status,
        shutdown,
    }
}

async fn send_raw(path: &PathBuf, payload: &[u8]) -> Result<Response, WireError> {
    let stream = UnixStream::connect(path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    wire::write_message(&mut writer, payload).await.unwrap();
    wire::read_frame(&mut reader).await
}

async fn send(path: &PathBuf, request: &Request) -> Response {
    let payload = serde_json::to_vec(request).unwrap();
    send_raw(path, &payload).await.unwrap()
}

#[tokio::test]
async fn hello_returns_daemon_version() {
    let h = spawn_listener();
    let response = send(
        &h.path,
        &Request::Hello {
            version: "0.0.0".to_string(),
        },
    )
    .await;
    assert_eq!(
        response,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn submit_is_forwarded_to_engine_loop() {
    let mut h = spawn_listener();
    let op = PendingOp::RemoveSession {
        session: SessionId(10),
    };

    assert_eq!(send(&h.path, &Request::Submit { op }).await, Response::Ok);
    assert_eq!(h.event_rx.recv().await, Some(Event::Submit { op }));
}

#[tokio::test]
async fn watchdog_report_is_forwarded() {
    let mut h = spawn_listener();
    let processes = vec![ProcessIdentifier::with_start_time(4242, 1_000)];

    let response = send(
        &h.path,
        &Request::ClientsNotResponding {
            processes: processes.clone(),
        },
    )
    .await;

    assert_eq!(response, Response::Ok);
    assert_eq!(
        h.event_rx.recv().await,
        Some(Event::ClientsNotResponding { processes })
    );
}

#[tokio::test]
async fn status_returns_published_snapshot() {
    let h = spawn_listener();
    h.status.lock().supervisor.state = ConnectionState::Crashed;

    let Response::Status { status } = send(&h.path, &Request::Status).await else {
        panic!("expected status response");
    };
    assert_eq!(status.supervisor.state, ConnectionState::Crashed);
}

#[tokio::test]
async fn shutdown_notifies_main_loop() {
    let h = spawn_listener();
    let notified = h.shutdown.notified();

    assert_eq!(send(&h.path, &Request::Shutdown).await, Response::Ok);
    tokio::time::timeout(std::time::Duration::from_secs(1), notified)
        .await
        .unwrap();
}

#[tokio::test]
async fn malformed_request_gets_error_response() {
    let mut h = spawn_listener();

    let response = send_raw(&h.path, br#"{"type":"Submit","op":"reboot"}"#)
        .await
        .unwrap();

    assert!(matches!(response, Response::Error { .. }));
    assert!(h.event_rx.try_recv().is_err());
}

#[tokio::test]
async fn closed_event_loop_drops_connection() {
    let h = spawn_listener();
    drop(h.event_rx);

    let payload = serde_json::to_vec(&Request::Connect).unwrap();
    let result = send_raw(&h.path, &payload).await;
    assert!(matches!(result, Err(WireError::ConnectionClosed)));
}
