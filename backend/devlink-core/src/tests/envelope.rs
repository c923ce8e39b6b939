use crate::error::rpc_client::RpcClientError;
use crate::rpc::RPC_CLIENT_PROTOCOL;
use crate::rpc::envelope::{build_request, parse_reply};

use common::{AuthBlob, ResultCode};

fn reply(service: &str, tail: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut parts = vec![
        RPC_CLIENT_PROTOCOL.as_bytes().to_vec(),
        service.as_bytes().to_vec(),
        vec![4],
    ];
    parts.extend(tail);
    parts
}

/// **VALUE**: Verifies request envelope layout with and without auth.
///
/// **WHY THIS MATTERS**: The server routes on the service part and reads the
/// command from a single byte; the auth blob must be the last part.
///
/// **BUG THIS CATCHES**: Would catch:
/// - parts out of order
/// - an empty auth part being sent when no auth was given
#[test]
fn given_request_when_built_then_parts_in_protocol_order() {
    let plain = build_request("logger", 3, b"payload".to_vec(), None);
    assert_eq!(
        plain,
        vec![
            b"RPCC01".to_vec(),
            b"logger".to_vec(),
            vec![3],
            b"payload".to_vec()
        ]
    );

    let auth = AuthBlob::new(vec![9, 9]);
    let signed = build_request("logger", 3, Vec::new(), Some(&auth));
    assert_eq!(signed.len(), 5);
    assert_eq!(signed[4], vec![9, 9]);
}

/// **VALUE**: Verifies a well-formed reply exposes command, code and payload.
///
/// **WHY THIS MATTERS**: `send_structured` relies on part order after the
/// command id.
///
/// **BUG THIS CATCHES**: Would catch the command id leaking into `parts`.
#[test]
fn given_valid_reply_when_parsed_then_code_and_payload_exposed() {
    let parts = reply("logger", vec![7u32.to_be_bytes().to_vec(), b"oops".to_vec()]);

    let parsed = parse_reply(parts, "logger").unwrap();

    assert_eq!(parsed.command, 4);
    assert_eq!(parsed.result_code().unwrap(), ResultCode(7));
    assert_eq!(parsed.payload(), b"oops");
}

/// **VALUE**: Verifies every malformed reply shape is a protocol error.
///
/// **WHY THIS MATTERS**: Protocol errors are not recoverable; treating them
/// as data would hand garbage to decoders.
///
/// **BUG THIS CATCHES**: Would catch:
/// - two-part replies being indexed out of bounds
/// - replies for another service being accepted
/// - an empty command part panicking
#[test]
fn given_malformed_reply_when_parsed_then_protocol_error() {
    let short = vec![b"RPCC01".to_vec(), b"logger".to_vec()];
    let wrong_tag = vec![b"RPCC02".to_vec(), b"logger".to_vec(), vec![1]];
    let wrong_service = reply("other", Vec::new());
    let empty_command = vec![b"RPCC01".to_vec(), b"logger".to_vec(), Vec::new()];

    for parts in [short, wrong_tag, wrong_service, empty_command] {
        let err = parse_reply(parts, "logger").unwrap_err();
        assert!(matches!(err, RpcClientError::Protocol { .. }), "{err}");
        assert!(!err.is_recoverable());
    }
}

/// **VALUE**: Verifies a missing or short result code is a protocol error.
///
/// **WHY THIS MATTERS**: Three-part replies are valid envelopes but cannot
/// carry a structured result.
///
/// **BUG THIS CATCHES**: Would catch a 2-byte code being zero-padded to OK.
#[test]
fn given_reply_without_full_code_when_code_read_then_protocol_error() {
    let none = parse_reply(reply("logger", Vec::new()), "logger").unwrap();
    assert!(none.result_code().is_err());
    assert!(none.payload().is_empty());

    let short = parse_reply(reply("logger", vec![vec![0, 0]]), "logger").unwrap();
    assert!(matches!(
        short.result_code(),
        Err(RpcClientError::Protocol { .. })
    ));
}
