use crate::listener::NotificationKind;
use crate::notifications::LogNotifications;
use crate::notifications::logs::format_log_event;
use crate::proto::{LogEvent, LogLevel};

use prost::Message as ProstMessage;

fn event(level: LogLevel) -> LogEvent {
    LogEvent {
        logger: "net".to_string(),
        msg: "link up".to_string(),
        // 2018-02-14T00:28:07.123456Z
        timestamp: 1_518_568_087_123_456,
        log_level: level as i32,
        location: "net.c:42".to_string(),
    }
}

/// **VALUE**: Verifies the trace line layout.
///
/// **WHY THIS MATTERS**: Operators grep saved traces by date, logger and level.
///
/// **BUG THIS CATCHES**: Would catch:
/// - timestamps read as milliseconds instead of microseconds
/// - the `T`/`Z` of RFC 3339 leaking into the line
#[test]
fn given_log_event_when_formatted_then_date_time_logger_level_message() {
    assert_eq!(
        format_log_event(&event(LogLevel::Info)),
        "2018-02-14 00:28:07.123 net L_INFO: link up"
    );
}

/// **VALUE**: Verifies timestamps render in UTC and negative ones clamp to
/// the epoch.
///
/// **WHY THIS MATTERS**: Saved traces from different hosts are compared line
/// by line; the date part must not depend on the host's zone.
///
/// **BUG THIS CATCHES**: Would catch:
/// - a local-zone shift moving a line across midnight
/// - a negative timestamp wrapping to a far-future date
#[test]
fn given_boundary_timestamps_when_formatted_then_utc_dates() {
    let mut before_midnight = event(LogLevel::Warn);
    // 2018-02-13T23:59:59.999Z
    before_midnight.timestamp = 1_518_566_399_999_000;
    assert_eq!(
        format_log_event(&before_midnight),
        "2018-02-13 23:59:59.999 net L_WARN: link up"
    );

    let mut negative = event(LogLevel::Warn);
    negative.timestamp = -5;
    assert_eq!(
        format_log_event(&negative),
        "1970-01-01 00:00:00.000 net L_WARN: link up"
    );
}

/// **VALUE**: Verifies history lines are numbered from 1.
///
/// **WHY THIS MATTERS**: RANGE arguments are 1-based and must match what
/// the operator saw.
///
/// **BUG THIS CATCHES**: Would catch 0-based numbering in listings.
#[test]
fn given_stored_event_when_formatted_as_message_then_one_based_number() {
    let kind = LogNotifications::new(vec!["net".to_string()], LogLevel::Fatal);

    let line = kind.format_message(0, &"net".to_string(), &event(LogLevel::Warn));

    assert!(line.starts_with("1 - 2018-02-14"), "{line}");
}

/// **VALUE**: Verifies the severity bypass threshold.
///
/// **WHY THIS MATTERS**: Events at or above the filter severity are kept even
/// for unsubscribed loggers.
///
/// **BUG THIS CATCHES**: Would catch an inverted comparison letting debug
/// noise through instead of errors.
#[test]
fn given_error_filter_when_checked_then_only_error_and_fatal_bypass() {
    let kind = LogNotifications::new(Vec::new(), LogLevel::Error);

    assert!(kind.bypasses_filter(&event(LogLevel::Fatal)));
    assert!(kind.bypasses_filter(&event(LogLevel::Error)));
    assert!(!kind.bypasses_filter(&event(LogLevel::Warn)));
    assert!(!kind.bypasses_filter(&event(LogLevel::Trace)));
}

/// **VALUE**: Verifies payload and logger-name decoding.
///
/// **WHY THIS MATTERS**: Both come straight off the wire.
///
/// **BUG THIS CATCHES**: Would catch invalid UTF-8 names being lossily
/// accepted or garbage payloads decoding to an empty event.
#[test]
fn given_wire_parts_when_decoded_then_event_or_error() {
    let kind = LogNotifications::new(Vec::new(), LogLevel::Fatal);
    let original = event(LogLevel::Debug);

    let id = kind.deserialize_notif_id(b"net").unwrap();
    let decoded = kind.decode(&id, &original.encode_to_vec()).unwrap();
    assert_eq!(decoded, original);

    assert!(kind.deserialize_notif_id(&[0xff, 0xfe]).is_err());
    assert!(kind.decode(&id, &[0xff, 0xff, 0xff]).is_err());
}

/// **VALUE**: Verifies cached logger names can be replaced.
///
/// **WHY THIS MATTERS**: Loggers appear at runtime on the device.
///
/// **BUG THIS CATCHES**: Would catch stale names after a refresh.
#[test]
fn given_new_loggers_when_set_then_notif_types_updated() {
    let kind = LogNotifications::new(vec!["a".to_string()], LogLevel::Fatal);

    kind.set_loggers(vec!["b".to_string(), "c".to_string()]);

    assert_eq!(kind.notif_types(), vec!["b", "c"]);
}
