// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tether_core::SessionId;
use tokio::net::UnixListener;

fn bind(dir: &tempfile::TempDir) -> (UnixListener, PathBuf) {
    let path = dir.path().join("companion.sock");
    let listener = UnixListener::bind(&path).unwrap();
    (listener, path)
}

#[tokio::test]
async fn handshake_and_call_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (listener, path) = bind(&dir);
    let transport = UnixSocketTransport::new(&path);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    transport.connect(event_tx).await.unwrap();
    let (mut companion, _) = listener.accept().await.unwrap();

    let hello: HostFrame = wire::read_frame(&mut companion).await.unwrap();
    assert!(matches!(hello, HostFrame::Hello { .. }));

    let handshake = CompanionFrame::Handshake {
        handle: Some(RemoteHandle::new("h1")),
    };
    wire::write_frame(&mut companion, &handshake).await.unwrap();
    assert_eq!(
        event_rx.recv().await,
        Some(Event::HandshakeCompleted {
            handle: RemoteHandle::new("h1")
        })
    );

    let call = CompanionCall::SessionRemoved {
        session: SessionId(10),
    };
    transport
        .call_one_way(&RemoteHandle::new("h1"), &call)
        .await
        .unwrap();
    let frame: HostFrame = wire::read_frame(&mut companion).await.unwrap();
    assert_eq!(
        frame,
        HostFrame::Call {
            handle: RemoteHandle::new("h1"),
            call
        }
    );
}

#[tokio::test]
async fn null_handshake_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (listener, path) = bind(&dir);
    let transport = UnixSocketTransport::new(&path);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    transport.connect(event_tx).await.unwrap();
    let (mut companion, _) = listener.accept().await.unwrap();
    let _: HostFrame = wire::read_frame(&mut companion).await.unwrap();
    wire::write_frame(&mut companion, &CompanionFrame::Handshake { handle: None })
        .await
        .unwrap();

    assert!(matches!(
        event_rx.recv().await,
        Some(Event::HandshakeFailed { .. })
    ));
}

#[tokio::test]
async fn companion_exit_reports_disconnect() {
    let dir = tempfile::tempdir().unwrap();
    let (listener, path) = bind(&dir);
    let transport = UnixSocketTransport::new(&path);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    transport.connect(event_tx).await.unwrap();
    let (companion, _) = listener.accept().await.unwrap();
    drop(companion);

    assert_eq!(event_rx.recv().await, Some(Event::Disconnected));
}

#[tokio::test]
async fn connect_without_listener_fails() {
    let dir = tempfile::tempdir().unwrap();
    let transport = UnixSocketTransport::new(dir.path().join("missing.sock"));
    let (event_tx, _event_rx) = mpsc::channel(8);

    let result = transport.connect(event_tx).await;
    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
}

#[tokio::test]
async fn call_before_connect_is_not_connected() {
    let transport = UnixSocketTransport::new("/nonexistent.sock");
    let result = transport
        .call_one_way(&RemoteHandle::new("h1"), &CompanionCall::InitBootSession)
        .await;
    assert!(matches!(result, Err(TransportError::NotConnected)));
}

#[tokio::test]
async fn disconnect_drops_writer_without_event() {
    let dir = tempfile::tempdir().unwrap();
    let (listener, path) = bind(&dir);
    let transport = UnixSocketTransport::new(&path);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    transport.connect(event_tx).await.unwrap();
    let (_companion, _) = listener.accept().await.unwrap();
    transport.disconnect().await;

    let result = transport
        .call_one_way(&RemoteHandle::new("h1"), &CompanionCall::InitBootSession)
        .await;
    assert!(matches!(result, Err(TransportError::NotConnected)));
    assert!(event_rx.try_recv().is_err());
}

#[tokio::test]
async fn stalled_companion_fails_call_within_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let (listener, path) = bind(&dir);
    let transport = UnixSocketTransport::new(&path).with_call_timeout(Duration::from_millis(200));
    let (event_tx, mut event_rx) = mpsc::channel(8);

    transport.connect(event_tx).await.unwrap();
    let (mut companion, _) = listener.accept().await.unwrap();
    let _: HostFrame = wire::read_frame(&mut companion).await.unwrap();
    let handshake = CompanionFrame::Handshake {
        handle: Some(RemoteHandle::new("h1")),
    };
    wire::write_frame(&mut companion, &handshake).await.unwrap();
    assert!(matches!(
        event_rx.recv().await,
        Some(Event::HandshakeCompleted { .. })
    ));

    // The companion keeps the socket open but never reads again
    let call = CompanionCall::SessionRemoved {
        session: SessionId(10),
    };
    let fill = async {
        loop {
            if let Err(e) = transport.call_one_way(&RemoteHandle::new("h1"), &call).await {
                return e;
            }
        }
    };
    let err = tokio::time::timeout(Duration::from_secs(10), fill)
        .await
        .unwrap();
    assert!(matches!(err, TransportError::CallFailed(_)));

    // The stalled writer is dropped
    let result = transport
        .call_one_way(&RemoteHandle::new("h1"), &CompanionCall::InitBootSession)
        .await;
    assert!(matches!(result, Err(TransportError::NotConnected)));
    drop(companion);
}
