use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error in devlink carries an ErrorLocation. If capture
/// is wrong, timeout and protocol errors point nowhere useful.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` propagation or
/// field extraction breaks.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: The location of this statement
    let expected_line = line!() + 1;
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture this file, this line and a column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, expected_line, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the Display format is `[file:line:column]`.
///
/// **WHY THIS MATTERS**: Every error message embeds this string.
///
/// **BUG THIS CATCHES**: Would catch a changed format (missing brackets, extra colons).
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed ErrorLocation
    let location = ErrorLocation {
        file: "src/rpc/client.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Bracketed file:line:column
    assert_eq!(formatted, "[src/rpc/client.rs:42:7]");
}

/// **VALUE**: Verifies `here()` reports the line of its caller.
///
/// **WHY THIS MATTERS**: Error constructors in devlink-core use `here()` inside
/// `#[track_caller]` conversions; a wrong line would mislead debugging.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[track_caller]` from `here()`.
#[test]
fn given_multiple_call_sites_when_capturing_with_here_then_each_has_unique_line() {
    // GIVEN: Two captures on consecutive lines
    let loc1 = ErrorLocation::here();
    let loc2 = ErrorLocation::here();

    // THEN: Same file, sequential lines
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert!(loc1.file.contains("error_location.rs"));
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}
