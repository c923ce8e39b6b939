use crate::error::TailError;

use common::ErrorLocation;

use devlink_core::error::config::ConfigError;
use devlink_core::error::listener::ListenerError;

use std::panic::Location;

/// **VALUE**: Verifies core errors land in the matching `TailError` variant
/// with their message kept.
///
/// **WHY THIS MATTERS**: The binary reports config problems differently from
/// device failures; the core message is all the user gets.
///
/// **BUG THIS CATCHES**: Would catch:
/// - config errors reported as device errors
/// - the core message being dropped on conversion
#[test]
fn given_core_errors_when_converted_then_matching_variant_with_message() {
    let config: TailError = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: "rpc.service cannot be empty".to_string(),
    }
    .into();
    match config {
        TailError::Config { message, .. } => assert!(message.contains("rpc.service")),
        other => panic!("Expected Config, got {other}"),
    }

    let listener: TailError = ListenerError::NotFound {
        name: "dsik".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
    .into();
    match listener {
        TailError::Core { message, .. } => assert!(message.contains("dsik")),
        other => panic!("Expected Core, got {other}"),
    }
}
