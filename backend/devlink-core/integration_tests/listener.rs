use crate::helpers::{
    DispatchGate, log_kind, log_notification, recording_callback, test_settings, wait_until,
};

use devlink_core::error::listener::ListenerError;
use devlink_core::listener::{HistoryRange, Listener, ListenerSettings};
use devlink_core::notifications::LogNotifications;
use devlink_core::proto::{LogEvent, LogLevel};
use devlink_core::transport::memory::{self, MemoryPeer};
use devlink_core::transport::{MemoryTransport, SessionMode};

use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn log_listener(
    loggers: &[&str],
    settings: ListenerSettings,
) -> (Listener<LogNotifications, MemoryTransport>, MemoryPeer) {
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let listener = Listener::new("log", log_kind(loggers), session, settings)
        .with_trace_callback(Arc::new(|_: &String, _: &LogEvent| {}));
    (listener, peer)
}

/// **VALUE**: Verifies the inbox keeps the newest 100 of 101 notifications.
///
/// **WHY THIS MATTERS**: History is bounded; the oldest record is the one to
/// go and absolute numbering must account for it.
///
/// **BUG THIS CATCHES**: Would catch:
/// - unbounded inbox growth
/// - `base_sequence` not counting the eviction
/// - `LAST 5` returning stale or misnumbered records
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_101_notifications_when_dispatched_then_inbox_holds_last_100() {
    // GIVEN: a running listener subscribed to "net", limits out of the way
    let settings = ListenerSettings {
        inpq_max_size: 10_000,
        inpq_threshold: 10_000,
        ..test_settings()
    };
    let (listener, peer) = log_listener(&["net"], settings);
    listener.register_notif_type("net").unwrap();
    assert!(listener.is_running());

    // WHEN: 101 notifications arrive
    for n in 0..101 {
        peer.send(log_notification("net", LogLevel::Info, &format!("msg {n}")))
            .unwrap();
    }

    // THEN: 100 kept, one evicted
    assert!(
        wait_until(WAIT, || listener.base_sequence() == 1).await,
        "eviction never happened"
    );
    assert_eq!(listener.inbox_len("net").unwrap(), 100);

    let last = listener.list_messages(HistoryRange::Last(5), "net").unwrap();
    let summary: Vec<(u64, String)> = last.into_iter().map(|e| (e.index, e.record.msg)).collect();
    assert_eq!(
        summary,
        (96..=100)
            .map(|n| (n, format!("msg {n}")))
            .collect::<Vec<_>>()
    );

    let lines = listener
        .format_messages(HistoryRange::Range(101, 200), "net")
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("101 - "), "{}", lines[0]);

    listener.stop().await;
    assert!(!listener.is_running());
}

/// **VALUE**: Verifies registration is idempotent and unregistration of an
/// unknown type fails.
///
/// **WHY THIS MATTERS**: Scripts re-subscribe freely; unsubscribing a typo
/// must be reported.
///
/// **BUG THIS CATCHES**: Would catch:
/// - a second registration wiping the history
/// - unregistering an absent type succeeding silently
#[tokio::test]
async fn given_registered_type_when_registered_again_then_history_kept() {
    let (listener, peer) = log_listener(&["net", "disk"], test_settings());
    listener.register_notif_type("net").unwrap();
    peer.send(log_notification("net", LogLevel::Info, "one")).unwrap();
    assert!(wait_until(WAIT, || listener.inbox_len("net").unwrap_or(0) == 1).await);

    listener.register_notif_type("net").unwrap();

    assert_eq!(listener.inbox_len("net").unwrap(), 1);
    assert_eq!(listener.subscribed_notifs(), vec!["net"]);
    assert!(listener.is_notif_type_registered("net"));
    assert!(!listener.is_notif_type_registered("disk"));

    let err = listener.unregister_notif_type("disk").unwrap_err();
    assert!(err.is_not_found(), "{err}");

    listener.unregister_notif_type("net").unwrap();
    assert!(listener.is_filter_list_empty());
    assert!(listener.inbox_len("net").unwrap_err().is_not_found());

    listener.stop().await;
}

/// **VALUE**: Verifies a bad notification does not stop dispatch.
///
/// **WHY THIS MATTERS**: One corrupt payload must not blind the operator to
/// everything after it.
///
/// **BUG THIS CATCHES**: Would catch the dispatch task dying on decode errors.
#[tokio::test]
async fn given_undecodable_notification_when_dispatched_then_later_ones_kept() {
    let (listener, peer) = log_listener(&["net"], test_settings());
    listener.register_notif_type("net").unwrap();

    peer.send(vec![b"net".to_vec(), vec![0xff, 0xff, 0xff]]).unwrap();
    peer.send(vec![vec![0xc3, 0x28]]).unwrap();
    peer.send(Vec::new()).unwrap();
    peer.send(log_notification("net", LogLevel::Info, "after")).unwrap();

    assert!(wait_until(WAIT, || listener.inbox_len("net").unwrap_or(0) == 1).await);
    let all = listener.list_messages(HistoryRange::All, "net").unwrap();
    assert_eq!(all[0].record.msg, "after");
    assert!(listener.is_running());

    listener.stop().await;
}

/// **VALUE**: Verifies severe events bypass subscriptions.
///
/// **WHY THIS MATTERS**: Errors from loggers nobody watches must still be
/// seen and kept.
///
/// **BUG THIS CATCHES**: Would catch:
/// - severe events from unsubscribed loggers being dropped
/// - routine events from unsubscribed loggers being kept
#[tokio::test]
async fn given_severity_filter_when_severe_event_from_unsubscribed_logger_then_kept_and_traced() {
    // GIVEN: listener with an Error severity filter and no subscriptions
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener = Listener::new(
        "log",
        LogNotifications::new(vec!["disk".to_string()], LogLevel::Error),
        session,
        test_settings(),
    )
    .with_trace_callback(recording_callback(Arc::clone(&seen)));
    listener.start().unwrap();

    // WHEN
    peer.send(log_notification("disk", LogLevel::Info, "routine")).unwrap();
    peer.send(log_notification("disk", LogLevel::Error, "failing")).unwrap();

    // THEN: only the error is kept and traced
    assert!(wait_until(WAIT, || listener.inbox_len("disk").is_ok()).await);
    let all = listener.list_messages(HistoryRange::All, "disk").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.msg, "failing");
    assert_eq!(*seen.lock().unwrap(), vec!["failing"]);

    listener.stop().await;
}

/// **VALUE**: Verifies tracing is independent of subscription.
///
/// **WHY THIS MATTERS**: Operators watch a logger live without filling its
/// history.
///
/// **BUG THIS CATCHES**: Would catch:
/// - trace requiring registration
/// - traced records being stored without registration
/// - disable_trace(None) leaving traces active
#[tokio::test]
async fn given_traced_unregistered_type_when_dispatched_then_traced_not_stored() {
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener = Listener::new("log", log_kind(&["net"]), session, test_settings())
        .with_trace_callback(recording_callback(Arc::clone(&seen)));

    listener.enable_trace("net").unwrap();
    assert!(listener.is_running(), "enable_trace starts the listener");
    peer.send(log_notification("net", LogLevel::Info, "live")).unwrap();

    assert!(wait_until(WAIT, || seen.lock().unwrap().len() == 1).await);
    assert!(listener.inbox_len("net").is_err());
    assert_eq!(listener.traced_notifs(), vec!["net"]);

    listener.disable_trace(None).unwrap();
    assert!(listener.traced_notifs().is_empty());

    listener.stop().await;
}

/// **VALUE**: Verifies traced lines can be saved to a file.
///
/// **WHY THIS MATTERS**: Long captures are reviewed after the fact.
///
/// **BUG THIS CATCHES**: Would catch the file being truncated per line.
#[tokio::test]
async fn given_trace_file_when_traced_then_lines_appended() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("trace.log");
    let (listener, peer) = log_listener(&["net"], test_settings());
    listener.set_trace_file(Some(path.clone()));

    listener.enable_trace_all().unwrap();
    peer.send(log_notification("net", LogLevel::Info, "first")).unwrap();
    peer.send(log_notification("net", LogLevel::Warn, "second")).unwrap();

    assert!(
        wait_until(WAIT, || {
            std::fs::read_to_string(&path)
                .map(|text| text.lines().count() == 2)
                .unwrap_or(false)
        })
        .await
    );
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("net L_INFO: first"), "{text}");
    assert!(text.contains("net L_WARN: second"), "{text}");

    listener.stop().await;
}

/// **VALUE**: Verifies stop clears history and a stopped listener restarts.
///
/// **WHY THIS MATTERS**: The session is handed back on stop so the same
/// listener can be reused.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the session being lost on stop
/// - history surviving a stop
#[tokio::test]
async fn given_stopped_listener_when_started_again_then_dispatch_resumes() {
    let (listener, peer) = log_listener(&["net"], test_settings());
    listener.register_notif_type("net").unwrap();
    peer.send(log_notification("net", LogLevel::Info, "before")).unwrap();
    assert!(wait_until(WAIT, || listener.inbox_len("net").unwrap_or(0) == 1).await);

    listener.stop().await;
    assert!(!listener.is_running());
    assert!(listener.inbox_len("net").is_err(), "stop clears the inbox");
    assert_eq!(listener.subscribed_notifs(), vec!["net"], "subscriptions kept");

    listener.start().unwrap();
    peer.send(log_notification("net", LogLevel::Info, "after")).unwrap();

    assert!(wait_until(WAIT, || listener.inbox_len("net").unwrap_or(0) == 1).await);
    let all = listener.list_messages(HistoryRange::All, "net").unwrap();
    assert_eq!(all[0].record.msg, "after");

    listener.close().await;
    assert!(!peer.is_client_connected());
}

/// **VALUE**: Verifies queue limits can be changed at runtime.
///
/// **WHY THIS MATTERS**: Operators raise limits during bursty captures.
///
/// **BUG THIS CATCHES**: Would catch `None` resetting a limit.
#[tokio::test]
async fn given_new_limits_when_set_then_only_given_values_change() {
    let (listener, _peer) = log_listener(&["net"], test_settings());

    listener.set_inpq_limits(Some(500), None);
    assert_eq!(listener.inpq_limits(), (500, 100));

    listener.set_inpq_limits(None, Some(40));
    assert_eq!(listener.inpq_limits(), (500, 40));
}

/// **VALUE**: Verifies PAGE 0 is rejected through the listener API.
///
/// **WHY THIS MATTERS**: Pages are numbered from 1.
///
/// **BUG THIS CATCHES**: Would catch PAGE 0 aliasing page 1.
#[tokio::test]
async fn given_page_zero_when_listed_then_invalid_range() {
    let (listener, _peer) = log_listener(&["net"], test_settings());
    listener.register_notif_type("net").unwrap();

    let err = listener
        .list_messages(HistoryRange::Page(0), "net")
        .unwrap_err();

    assert!(
        matches!(err, ListenerError::InvalidRange { .. }),
        "{err}"
    );
    listener.stop().await;
}

/// **VALUE**: Verifies the soft overflow drops subscriptions but keeps the
/// listener alive.
///
/// **WHY THIS MATTERS**: A stalled consumer must shed load instead of
/// aborting, and the history gathered so far must survive.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the soft limit not triggering while the dispatcher is stalled
/// - subscriptions or traces surviving the overflow
/// - the listener stopping or losing its inbox
/// - the fatal handler firing below the hard limit
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_stalled_dispatcher_when_threshold_reached_then_subscriptions_dropped() {
    // GIVEN: max 5, threshold 3, and a trace callback that stalls dispatch
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let gate = DispatchGate::default();
    let fatal = Arc::new(Mutex::new(Vec::new()));
    let fatal_seen = Arc::clone(&fatal);
    let settings = ListenerSettings {
        inpq_max_size: 5,
        inpq_threshold: 3,
        ..test_settings()
    };
    let listener = Listener::new("log", log_kind(&["net"]), session, settings)
        .with_trace_callback(gate.callback())
        .with_fatal_overflow_handler(Arc::new(move |name: &str, depth: usize| {
            fatal_seen.lock().unwrap().push((name.to_string(), depth));
        }));
    listener.register_notif_type("net").unwrap();
    listener.enable_trace("net").unwrap();

    // GIVEN: dispatcher stuck in the callback for the first notification
    peer.send(log_notification("net", LogLevel::Info, "stall")).unwrap();
    assert!(wait_until(WAIT, || gate.entered() == 1).await);

    // WHEN: three more arrive
    for n in 0..3 {
        peer.send(log_notification("net", LogLevel::Info, &format!("queued {n}")))
            .unwrap();
    }

    // THEN: everything is unsubscribed, the listener keeps running
    assert!(wait_until(WAIT, || listener.soft_overflow_count() == 1).await);
    assert!(listener.is_filter_list_empty());
    assert!(listener.traced_notifs().is_empty());
    assert!(listener.is_running());
    assert_eq!(listener.queue_len(), 3);
    assert!(fatal.lock().unwrap().is_empty());

    // THEN: once released the queue drains and the inbox is kept
    gate.release();
    assert!(wait_until(WAIT, || listener.queue_len() == 0).await);
    let all = listener.list_messages(HistoryRange::All, "net").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.msg, "stall");

    listener.stop().await;
}

/// **VALUE**: Verifies reaching the hard limit runs the fatal handler and
/// stops receiving.
///
/// **WHY THIS MATTERS**: Past the hard limit memory use is unbounded; the
/// process must not keep queueing.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the hard limit never being checked
/// - the receive loop continuing after the fatal action
/// - `start` or `register_notif_type` reporting success on halted tasks
/// - the listener not restarting after an explicit stop
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_stalled_dispatcher_when_max_size_reached_then_fatal_handler_runs() {
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let gate = DispatchGate::default();
    let fatal = Arc::new(Mutex::new(Vec::new()));
    let fatal_seen = Arc::clone(&fatal);
    let settings = ListenerSettings {
        inpq_max_size: 2,
        inpq_threshold: 2,
        ..test_settings()
    };
    let listener = Listener::new("log", log_kind(&["net"]), session, settings)
        .with_trace_callback(gate.callback())
        .with_fatal_overflow_handler(Arc::new(move |name: &str, depth: usize| {
            fatal_seen.lock().unwrap().push((name.to_string(), depth));
        }));
    listener.enable_trace("net").unwrap();

    peer.send(log_notification("net", LogLevel::Info, "stall")).unwrap();
    assert!(wait_until(WAIT, || gate.entered() == 1).await);
    for n in 0..3 {
        peer.send(log_notification("net", LogLevel::Info, &format!("queued {n}")))
            .unwrap();
    }

    assert!(wait_until(WAIT, || !fatal.lock().unwrap().is_empty()).await);
    assert_eq!(*fatal.lock().unwrap(), vec![("log".to_string(), 2)]);
    assert!(!listener.is_running());

    // Halted tasks are reported until the listener is stopped
    assert!(matches!(listener.start(), Err(ListenerError::Runtime { .. })));
    assert!(matches!(
        listener.register_notif_type("net"),
        Err(ListenerError::Runtime { .. })
    ));

    gate.release();
    listener.stop().await;

    listener.start().expect("restart after stop");
    assert!(listener.is_running());
    listener.stop().await;
}
