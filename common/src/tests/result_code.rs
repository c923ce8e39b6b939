use crate::ResultCode;

/// **VALUE**: Verifies only code 0 counts as success.
///
/// **WHY THIS MATTERS**: `send_structured` decodes the payload only on success;
/// misclassifying would hand error text to a protobuf decoder.
///
/// **BUG THIS CATCHES**: Would catch an inverted or widened `is_ok` check.
#[test]
fn given_result_codes_when_is_ok_checked_then_only_zero_succeeds() {
    assert!(ResultCode(0).is_ok());
    assert!(ResultCode::OK.is_ok());
    assert!(!ResultCode(1).is_ok());
    assert!(!ResultCode(u32::MAX).is_ok());
}

/// **VALUE**: Verifies busy-server codes are flagged as retryable.
///
/// **WHY THIS MATTERS**: Callers use this to decide whether to retry a failed call.
///
/// **BUG THIS CATCHES**: Would catch permanent errors being retried forever.
#[test]
fn given_transient_codes_when_is_retryable_checked_then_true_only_for_transient() {
    assert!(ResultCode::TIMEOUT.is_retryable());
    assert!(ResultCode::SERVICE_NOT_AVAILABLE.is_retryable());
    assert!(ResultCode::CMD_IN_PROGRESS.is_retryable());
    assert!(!ResultCode::INVALID_PARAMETERS.is_retryable());
    assert!(!ResultCode::OBJECT_NOT_FOUND.is_retryable());
}

/// **VALUE**: Verifies Display shows number and description.
///
/// **WHY THIS MATTERS**: RPC errors are logged through this formatting.
///
/// **BUG THIS CATCHES**: Would catch unknown codes panicking or losing the number.
#[test]
fn given_codes_when_displayed_then_include_number_and_text() {
    assert_eq!(ResultCode(2).to_string(), "2 (Invalid parameters)");
    assert_eq!(ResultCode(999).to_string(), "999 (Unknown result code)");
}
