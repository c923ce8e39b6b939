use crate::AuthBlob;

/// **VALUE**: Verifies auth bytes never appear in Debug or Display output.
///
/// **WHY THIS MATTERS**: RPC requests are debug-logged; a leaked signature
/// would end up in log files.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug replacing the manual impl.
#[test]
fn given_auth_blob_when_formatted_then_bytes_are_redacted() {
    // GIVEN: A blob with recognisable content
    let blob = AuthBlob::new(b"secret-signature".to_vec());

    // WHEN: Formatting
    let debug = format!("{blob:?}");
    let display = format!("{blob}");

    // THEN: Neither contains the content
    assert!(!debug.contains("secret"));
    assert!(!display.contains("secret"));
    assert!(debug.contains("16 bytes"));
}

/// **VALUE**: Verifies raw access returns the exact bytes.
///
/// **WHY THIS MATTERS**: The envelope must carry the untouched blob.
///
/// **BUG THIS CATCHES**: Would catch encoding or truncation in `as_bytes`.
#[test]
fn given_auth_blob_when_as_bytes_then_returns_original() {
    let blob = AuthBlob::new(vec![0u8, 1, 2, 255]);
    assert_eq!(blob.as_bytes(), &[0u8, 1, 2, 255]);
    assert_eq!(blob.len(), 4);
    assert!(!blob.is_empty());
}
