// Unit tests for logger module initialization logic

use crate::logger::{LOG_FILE_NAME, initialize};

use log::LevelFilter;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: fern installs a process-global logger; a second
/// install would fail and abort startup.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when trying to set a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = std::env::temp_dir().join("devlink-tail-test-logger");
    std::fs::create_dir_all(&temp_dir).unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(&temp_dir, LevelFilter::Debug);
    let result2 = initialize(&temp_dir, LevelFilter::Debug);

    // THEN: Both return Ok and the log file exists
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
    assert!(temp_dir.join(LOG_FILE_NAME).exists());

    // Cleanup
    std::fs::remove_dir_all(&temp_dir).ok();
}
