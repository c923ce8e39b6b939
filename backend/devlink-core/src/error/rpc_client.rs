use crate::error::transport::TransportError;

use common::{ErrorLocation, ResultCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Result code carried by every [`RpcClientError::Timeout`].
///
/// The session has already been reopened when this is raised; the caller
/// decides whether to repeat the call.
pub const TIMEOUT_RETRY_CODE: u32 = 1;

#[derive(Debug, ThisError)]
pub enum RpcClientError {
    #[error("Timeout Error: code {code}: {message} {location}")]
    Timeout {
        code: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("RPC Error {result_code}: {message} {location}")]
    Rpc {
        result_code: ResultCode,
        message: String,
        payload: Vec<u8>,
        location: ErrorLocation,
    },

    #[error("Protocol Error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },

    #[error("Endpoint Error: {message} {location}")]
    Endpoint {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protobuf Decode Error: {message} {location}")]
    ProtobufDecode {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RpcClientError {
    /// Timeouts and non-zero result codes may be retried by the caller.
    /// Protocol violations mean the session is out of step with its peer.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Rpc { .. })
    }

    /// Numeric code for timeouts and RPC failures.
    pub fn result_code(&self) -> Option<u32> {
        match self {
            Self::Timeout { code, .. } => Some(*code),
            Self::Rpc { result_code, .. } => Some(result_code.0),
            _ => None,
        }
    }
}

impl From<prost::DecodeError> for RpcClientError {
    #[track_caller]
    fn from(error: prost::DecodeError) -> Self {
        RpcClientError::ProtobufDecode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for RpcClientError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        RpcClientError::Endpoint {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
