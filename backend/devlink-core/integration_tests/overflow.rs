use crate::helpers::{DispatchGate, log_kind, log_notification, test_settings, wait_until};

use devlink_core::listener::{Listener, ListenerSettings};
use devlink_core::proto::LogLevel;
use devlink_core::transport::SessionMode;
use devlink_core::transport::memory;

use std::process::Command;
use std::time::Duration;

const CHILD_ENV: &str = "DEVLINK_OVERFLOW_CHILD";

/// Runs only inside the child process started by the test below; there it
/// overflows a listener that still has the default fatal handler.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hard_overflow_child_process() {
    if std::env::var_os(CHILD_ENV).is_none() {
        return;
    }

    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let gate = DispatchGate::default();
    let settings = ListenerSettings {
        inpq_max_size: 2,
        inpq_threshold: 2,
        ..test_settings()
    };
    let listener = Listener::new("log", log_kind(&["net"]), session, settings)
        .with_trace_callback(gate.callback());
    listener.enable_trace("net").unwrap();

    peer.send(log_notification("net", LogLevel::Info, "stall")).unwrap();
    assert!(wait_until(Duration::from_secs(5), || gate.entered() == 1).await);
    for n in 0..3 {
        peer.send(log_notification("net", LogLevel::Info, &format!("queued {n}")))
            .unwrap();
    }

    // the fatal handler exits the process before this returns
    tokio::time::sleep(Duration::from_secs(10)).await;
}

/// **VALUE**: Verifies the hard queue limit terminates the process with
/// status 1 by default.
///
/// **WHY THIS MATTERS**: A listener that cannot keep up past the hard limit
/// must fail loudly instead of consuming memory without bound.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the default fatal action not exiting
/// - exiting with status 0, which supervisors treat as a clean stop
#[test]
fn given_default_handler_when_max_size_reached_then_process_exits_with_status_1() {
    // GIVEN: this test binary re-run with only the child test selected
    let exe = std::env::current_exe().expect("No current test binary");

    // WHEN
    let status = Command::new(exe)
        .args([
            "overflow::hard_overflow_child_process",
            "--exact",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .status()
        .expect("Failed to run child process");

    // THEN
    assert_eq!(status.code(), Some(1));
}
