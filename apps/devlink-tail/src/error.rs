use common::ErrorLocation;

use devlink_core::error::config::ConfigError;
use devlink_core::error::listener::ListenerError;
use devlink_core::error::rpc_client::RpcClientError;
use devlink_core::error::transport::TransportError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the tail binary.
#[derive(Debug, Error)]
pub enum TailError {
    /// Error from this app
    #[error("Tail Error: {message} {location}")]
    Tail {
        message: String,
        location: ErrorLocation,
    },

    /// Error from devlink-core (rpc, listener, transport)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for TailError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        TailError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<RpcClientError> for TailError {
    #[track_caller]
    fn from(error: RpcClientError) -> Self {
        TailError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ListenerError> for TailError {
    #[track_caller]
    fn from(error: ListenerError) -> Self {
        TailError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<TransportError> for TailError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        TailError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
