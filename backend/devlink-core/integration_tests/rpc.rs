use crate::helpers::{TEST_SERVICE, reply};

use devlink_core::error::rpc_client::{RpcClientError, TIMEOUT_RETRY_CODE};
use devlink_core::log_service::{self, LOG_RPC_SERVICE};
use devlink_core::proto::log_command::{GET_LOG_LEVEL, GET_LOGGERS, SET_LOG_LEVEL};
use devlink_core::proto::{GetLogLevelResponse, GetLoggersResponse, LogLevel, SetLogLevelRequest};
use devlink_core::rpc::{RpcClient, ServerEndpoint};
use devlink_core::transport::memory::{self, MemoryPeer};
use devlink_core::transport::{MemoryTransport, SessionMode};

use common::{AuthBlob, ResultCode};

use std::time::Duration;

use prost::Message as ProstMessage;

async fn connected_client() -> (RpcClient<MemoryTransport>, MemoryPeer) {
    let (transport, peer) = memory::session("mem://device", SessionMode::Request);
    let endpoint = ServerEndpoint::new("mem://device", TEST_SERVICE, None)
        .expect("Failed to build endpoint");
    let client = RpcClient::with_transport(endpoint, transport)
        .await
        .expect("Failed to connect client")
        .with_timeout(Duration::from_millis(100));
    (client, peer)
}

/// **VALUE**: Verifies an unanswered call times out, reopens the session
/// and leaves the client usable even when the peer answers the first request
/// late.
///
/// **WHY THIS MATTERS**: A device that drops or delays one request must not
/// wedge the session; the next call has to go through on a fresh connection
/// and receive its own answer.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the call hanging forever without a reply
/// - a timeout without the close/reopen cycle
/// - a wrong retry code in the timeout error
/// - the follow-up call reading the late reply to the first call
#[tokio::test]
async fn given_slow_peer_when_send_times_out_then_late_reply_is_dropped_and_next_call_succeeds() {
    // GIVEN: connected client and a peer that does not answer in time
    let (mut client, mut peer) = connected_client().await;
    assert_eq!(peer.connects(), 1);

    // WHEN: the first call gets no reply
    let err = client.send(7, Vec::new(), None, None).await.unwrap_err();

    // THEN: Timeout with the retry code after a close and reopen
    assert!(
        matches!(err, RpcClientError::Timeout { code, .. } if code == TIMEOUT_RETRY_CODE),
        "{err}"
    );
    assert!(err.is_recoverable());
    assert_eq!(peer.closes(), 1);
    assert_eq!(peer.connects(), 2);
    assert!(client.is_connected());

    // WHEN: the peer answers the first request after the reopen
    let first = peer.try_recv().expect("first request reached the peer");
    assert_eq!(first[2], vec![7]);
    peer.send(reply(TEST_SERVICE, 7, 0, b"reply-to-first"))
        .expect("late reply");

    // AND: the next call is answered
    let (result, _) = tokio::join!(client.send(8, Vec::new(), None, None), async {
        let request = peer.recv().await.expect("request");
        peer.send(reply(TEST_SERVICE, request[2][0], 0, b"pong"))
            .expect("reply");
    });

    // THEN: the second call gets its own reply
    let reply = result.expect("second call succeeds");
    assert_eq!(reply.command, 8);
    assert_eq!(reply.payload(), b"pong");
}

/// **VALUE**: Verifies a reply to a different command is rejected and the
/// session reopened.
///
/// **WHY THIS MATTERS**: Once request and reply fall out of step every later
/// answer belongs to the wrong call.
///
/// **BUG THIS CATCHES**: Would catch:
/// - an out-of-sequence reply being returned as the answer
/// - the session staying desynchronised after the mismatch
#[tokio::test]
async fn given_reply_for_other_command_when_send_then_protocol_error_and_reopen() {
    let (mut client, mut peer) = connected_client().await;

    let (result, _) = tokio::join!(client.send(3, Vec::new(), None, None), async {
        peer.recv().await.expect("request");
        peer.send(reply(TEST_SERVICE, 4, 0, &[])).expect("reply");
    });

    let err = result.unwrap_err();
    assert!(matches!(err, RpcClientError::Protocol { .. }), "{err}");
    assert_eq!(peer.closes(), 1);
    assert_eq!(peer.connects(), 2);
    assert!(client.is_connected());
}

/// **VALUE**: Verifies a failed reopen after a timeout is reported instead of
/// a plain timeout.
///
/// **WHY THIS MATTERS**: `Timeout` promises a reopened session; a caller
/// retrying on a dead session would only fail again.
///
/// **BUG THIS CATCHES**: Would catch the reconnect failure being swallowed.
#[tokio::test]
async fn given_peer_refusing_reconnect_when_send_times_out_then_transport_error() {
    let (mut client, peer) = connected_client().await;
    peer.refuse_connects(true);

    let err = client.send(7, Vec::new(), None, None).await.unwrap_err();

    assert!(matches!(err, RpcClientError::Transport(_)), "{err}");
    assert!(!client.is_connected());

    // Recovers once the peer accepts again
    peer.refuse_connects(false);
    client.reconnect().await.expect("reconnect succeeds");
    assert!(client.is_connected());
}

/// **VALUE**: Verifies structured calls decode on code 0.
///
/// **WHY THIS MATTERS**: Logger discovery runs through this path.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the result code being fed to the protobuf decoder
/// - requests going to the endpoint's service instead of "logger"
#[tokio::test]
async fn given_ok_reply_when_get_loggers_then_response_decoded() {
    let (mut client, mut peer) = connected_client().await;
    let response = GetLoggersResponse {
        loggers: vec!["net".to_string(), "disk".to_string()],
    };

    let (loggers, request) = tokio::join!(log_service::get_loggers(&mut client), async {
        let request = peer.recv().await.expect("request");
        peer.send(reply(LOG_RPC_SERVICE, GET_LOGGERS, 0, &response.encode_to_vec()))
            .expect("reply");
        request
    });

    assert_eq!(loggers.unwrap(), vec!["net", "disk"]);
    assert_eq!(request[1], LOG_RPC_SERVICE.as_bytes());
    assert_eq!(request[2], vec![GET_LOGGERS]);
    assert!(request[3].is_empty(), "empty request payload");
}

/// **VALUE**: Verifies request payloads are encoded and level getters decode.
///
/// **WHY THIS MATTERS**: Level control is the main write path of the log
/// service.
///
/// **BUG THIS CATCHES**: Would catch the request message not being sent.
#[tokio::test]
async fn given_level_calls_when_sent_then_request_encoded_and_level_decoded() {
    let (mut client, mut peer) = connected_client().await;

    let (set, request) = tokio::join!(
        log_service::set_log_level(&mut client, "net", LogLevel::Debug),
        async {
            let request = peer.recv().await.expect("request");
            peer.send(reply(LOG_RPC_SERVICE, SET_LOG_LEVEL, 0, &[]))
                .expect("reply");
            request
        }
    );
    set.expect("set level succeeds");
    let sent = SetLogLevelRequest::decode(request[3].as_slice()).unwrap();
    assert_eq!(sent.logger, "net");
    assert_eq!(sent.log_level, LogLevel::Debug as i32);

    let answer = GetLogLevelResponse {
        log_level: LogLevel::Warn as i32,
    };
    let (level, _) = tokio::join!(log_service::get_log_level(&mut client, "net"), async {
        peer.recv().await.expect("request");
        peer.send(reply(LOG_RPC_SERVICE, GET_LOG_LEVEL, 0, &answer.encode_to_vec()))
            .expect("reply");
    });
    assert_eq!(level.unwrap(), LogLevel::Warn);
}

/// **VALUE**: Verifies a non-zero result code surfaces as `Rpc` with payload.
///
/// **WHY THIS MATTERS**: The payload of a failed call is the device's
/// explanation.
///
/// **BUG THIS CATCHES**: Would catch:
/// - error payloads decoded as a response
/// - the result code being lost
#[tokio::test]
async fn given_error_code_when_send_structured_then_rpc_error_with_payload() {
    let (mut client, mut peer) = connected_client().await;

    let (result, _) = tokio::join!(
        client.send_structured::<(), GetLoggersResponse>(GET_LOGGERS, None, None, None),
        async {
            peer.recv().await.expect("request");
            peer.send(reply(TEST_SERVICE, GET_LOGGERS, 2, b"bad logger"))
                .expect("reply");
        }
    );

    match result.unwrap_err() {
        RpcClientError::Rpc {
            result_code,
            message,
            payload,
            ..
        } => {
            assert_eq!(result_code, ResultCode::INVALID_PARAMETERS);
            assert_eq!(message, "bad logger");
            assert_eq!(payload, b"bad logger");
        }
        other => panic!("Expected Rpc error, got {other}"),
    }
}

/// **VALUE**: Verifies a reply for another service is a protocol error.
///
/// **WHY THIS MATTERS**: Routing mix-ups must not be mistaken for answers.
///
/// **BUG THIS CATCHES**: Would catch the service echo going unchecked.
#[tokio::test]
async fn given_reply_for_other_service_when_send_then_protocol_error() {
    let (mut client, mut peer) = connected_client().await;

    let (result, _) = tokio::join!(client.send(1, Vec::new(), None, None), async {
        peer.recv().await.expect("request");
        peer.send(reply("other", 1, 0, &[])).expect("reply");
    });

    let err = result.unwrap_err();
    assert!(matches!(err, RpcClientError::Protocol { .. }), "{err}");
    assert!(!err.is_recoverable());
}

/// **VALUE**: Verifies the auth blob travels as the final part.
///
/// **WHY THIS MATTERS**: Privileged commands are rejected without it.
///
/// **BUG THIS CATCHES**: Would catch the blob being dropped or misplaced.
#[tokio::test]
async fn given_auth_blob_when_send_then_appended_after_payload() {
    let (mut client, mut peer) = connected_client().await;
    let auth = AuthBlob::new(b"secret".to_vec());

    let (_, request) = tokio::join!(
        client.send(5, b"body".to_vec(), Some("admin"), Some(&auth)),
        async {
            let request = peer.recv().await.expect("request");
            peer.send(reply("admin", 5, 0, &[])).expect("reply");
            request
        }
    );

    assert_eq!(request.len(), 5);
    assert_eq!(request[1], b"admin");
    assert_eq!(request[3], b"body");
    assert_eq!(request[4], b"secret");
}
