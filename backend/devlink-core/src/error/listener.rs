use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ListenerError {
    #[error("Notification Not Found Error: {name} {location}")]
    NotFound {
        name: String,
        location: ErrorLocation,
    },

    #[error("Invalid Range Error: {message} {location}")]
    InvalidRange {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Runtime Error: {message} {location}")]
    Runtime {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ListenerError {
    #[track_caller]
    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        ListenerError::NotFound {
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<prost::DecodeError> for ListenerError {
    #[track_caller]
    fn from(error: prost::DecodeError) -> Self {
        ListenerError::Decode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
