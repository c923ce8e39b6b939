use crate::error::rpc_client::RpcClientError;
use crate::rpc::RPC_CLIENT_PROTOCOL;
use crate::transport::Multipart;

use common::{AuthBlob, ErrorLocation, ResultCode};

use std::panic::Location;

const RESULT_CODE_SIZE: usize = 4;

/// Validated reply to one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    /// Command id echoed by the server.
    pub command: u8,
    /// Parts following the command id: result code, then response payload(s).
    pub parts: Vec<Vec<u8>>,
}

impl RpcReply {
    /// Decode the 4-byte big-endian result code.
    pub fn result_code(&self) -> Result<ResultCode, RpcClientError> {
        let raw = self.parts.first().ok_or_else(|| RpcClientError::Protocol {
            message: "Reply carries no result code".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let bytes: [u8; RESULT_CODE_SIZE] =
            raw.as_slice()
                .try_into()
                .map_err(|_| RpcClientError::Protocol {
                    message: format!("Bad result code length: {}", raw.len()),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        Ok(ResultCode(u32::from_be_bytes(bytes)))
    }

    /// Response (or error) payload; empty when the server sent none.
    pub fn payload(&self) -> &[u8] {
        self.parts.get(1).map(Vec::as_slice).unwrap_or_default()
    }
}

pub(crate) fn build_request(
    service: &str,
    command: u8,
    payload: Vec<u8>,
    auth: Option<&AuthBlob>,
) -> Multipart {
    let mut parts = vec![
        RPC_CLIENT_PROTOCOL.as_bytes().to_vec(),
        service.as_bytes().to_vec(),
        vec![command],
        payload,
    ];
    if let Some(auth) = auth {
        parts.push(auth.as_bytes().to_vec());
    }
    parts
}

pub(crate) fn parse_reply(parts: Multipart, service: &str) -> Result<RpcReply, RpcClientError> {
    if parts.len() < 3 {
        return Err(RpcClientError::Protocol {
            message: format!("Bad response length: {}", parts.len()),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut parts = parts.into_iter();
    let protocol = parts.next().unwrap_or_default();
    let reply_service = parts.next().unwrap_or_default();
    let command = parts.next().unwrap_or_default();

    if protocol != RPC_CLIENT_PROTOCOL.as_bytes() {
        return Err(RpcClientError::Protocol {
            message: format!(
                "Bad client protocol: {}",
                String::from_utf8_lossy(&protocol)
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if reply_service != service.as_bytes() {
        return Err(RpcClientError::Protocol {
            message: format!(
                "Bad service: expected '{}', got '{}'",
                service,
                String::from_utf8_lossy(&reply_service)
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let command = *command.first().ok_or_else(|| RpcClientError::Protocol {
        message: "Empty command id part".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(RpcReply {
        command,
        parts: parts.collect(),
    })
}
