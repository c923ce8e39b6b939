use crate::helpers::{
    TEST_SERVICE, log_kind, log_notification, reply, start_test_device, test_settings, wait_until,
};

use devlink_core::error::rpc_client::RpcClientError;
use devlink_core::listener::{HistoryRange, Listener};
use devlink_core::proto::LogLevel;
use devlink_core::rpc::{RpcClient, ServerEndpoint};
use devlink_core::transport::{Multipart, SessionMode, Transport, WsTransport};

use std::time::Duration;

fn echo(request: Multipart) -> Option<Multipart> {
    let service = String::from_utf8_lossy(&request[1]).into_owned();
    Some(reply(&service, request[2][0], 0, &request[3]))
}

fn silent(_: Multipart) -> Option<Multipart> {
    None
}

/// **VALUE**: Verifies a full call over a real WebSocket connection.
///
/// **WHY THIS MATTERS**: This is the production transport; framing, the
/// identity header and reply matching all have to line up.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the identity header missing from the handshake
/// - multipart packing differing between the two sides
#[tokio::test]
async fn given_ws_device_when_rpc_sent_then_reply_received_with_identity() {
    // GIVEN
    let device = start_test_device(Vec::new(), echo).await;
    let endpoint =
        ServerEndpoint::new(device.address.as_str(), TEST_SERVICE, Some("bench-7".to_string()))
            .unwrap();

    // WHEN
    let mut client = RpcClient::connect(endpoint).await.expect("Failed to connect");
    let reply = client.send(9, b"hello".to_vec(), None, None).await.unwrap();

    // THEN
    assert_eq!(reply.command, 9);
    assert_eq!(reply.payload(), b"hello");
    assert_eq!(device.identity.lock().unwrap().as_deref(), Some("bench-7"));

    client.close().await;
    assert!(!client.is_connected());
    device.handle.abort();
}

/// **VALUE**: Verifies a WebSocket timeout reconnects the session.
///
/// **WHY THIS MATTERS**: The reconnect path opens a new TCP connection; the
/// client must be connected again when the error comes back.
///
/// **BUG THIS CATCHES**: Would catch the client being left disconnected.
#[tokio::test]
async fn given_silent_ws_device_when_rpc_sent_then_timeout_and_reconnected() {
    let device = start_test_device(Vec::new(), silent).await;
    let endpoint = ServerEndpoint::new(device.address.as_str(), TEST_SERVICE, None).unwrap();
    let mut client = RpcClient::connect(endpoint)
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(100));

    let err = client.send(1, Vec::new(), None, None).await.unwrap_err();

    assert!(matches!(err, RpcClientError::Timeout { code: 1, .. }), "{err}");
    assert!(client.is_connected());
    device.handle.abort();
}

/// **VALUE**: Verifies subscribe sessions refuse to send and reject bad
/// addresses.
///
/// **WHY THIS MATTERS**: A receive-only session writing to the publisher is
/// a programming error.
///
/// **BUG THIS CATCHES**: Would catch `http://` addresses being accepted.
#[tokio::test]
async fn given_subscribe_session_when_send_then_error() {
    let device = start_test_device(Vec::new(), silent).await;
    let mut session = WsTransport::subscribe(&device.address).unwrap();
    session.connect().await.unwrap();
    assert_eq!(session.mode(), SessionMode::Subscribe);

    assert!(session.send(vec![b"x".to_vec()]).await.is_err());
    assert!(WsTransport::subscribe("http://127.0.0.1:1/").is_err());

    session.close().await;
    device.handle.abort();
}

/// **VALUE**: Verifies a listener consumes notifications pushed over WebSocket.
///
/// **WHY THIS MATTERS**: End-to-end path from the device's publisher to the
/// operator's history.
///
/// **BUG THIS CATCHES**: Would catch the listener never connecting its
/// session.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_ws_publisher_when_listener_subscribed_then_history_filled() {
    let published = (0..3)
        .map(|n| log_notification("net", LogLevel::Info, &format!("ws {n}")))
        .collect();
    let device = start_test_device(published, silent).await;

    let session = WsTransport::subscribe(&device.address).unwrap();
    let listener = Listener::new("log", log_kind(&["net"]), session, test_settings());
    listener.register_notif_type("net").unwrap();

    assert!(
        wait_until(Duration::from_secs(5), || {
            listener.inbox_len("net").unwrap_or(0) == 3
        })
        .await
    );
    let all = listener.list_messages(HistoryRange::All, "net").unwrap();
    assert_eq!(all[2].record.msg, "ws 2");

    listener.close().await;
    device.handle.abort();
}
