use crate::cli::TailArgs;

use devlink_core::listener::HistoryRange;
use devlink_core::proto::LogLevel;

use std::path::PathBuf;

use clap::Parser;

/// **VALUE**: Verifies the full argument set parses into typed values.
///
/// **WHY THIS MATTERS**: Levels and ranges are validated at parse time so a
/// typo fails before anything connects to the device.
///
/// **BUG THIS CATCHES**: Would catch:
/// - repeated `--logger` keeping only the last value
/// - `--set-level` losing the logger name
#[test]
fn given_full_command_line_when_parsed_then_typed_values() {
    let args = TailArgs::try_parse_from([
        "devlink-tail",
        "--config",
        "/etc/devlink.toml",
        "--logger",
        "net",
        "--logger",
        "disk",
        "--severity",
        "error",
        "--set-level",
        "net=L_DEBUG",
        "--history",
        "LAST 10",
    ])
    .unwrap();

    assert_eq!(args.config_path().unwrap(), PathBuf::from("/etc/devlink.toml"));
    assert_eq!(args.loggers, vec!["net", "disk"]);
    assert_eq!(args.severity, Some(LogLevel::Error));
    assert_eq!(args.set_levels, vec![("net".to_string(), LogLevel::Debug)]);
    assert_eq!(args.history, Some(HistoryRange::Last(10)));
    assert!(!args.list_loggers);
}

/// **VALUE**: Verifies malformed values are rejected by the parser.
///
/// **WHY THIS MATTERS**: Bad values must fail with a usage error, not later.
///
/// **BUG THIS CATCHES**: Would catch unvalidated strings reaching the device.
#[test]
fn given_bad_values_when_parsed_then_usage_error() {
    for bad in [
        ["devlink-tail", "--severity", "loud"],
        ["devlink-tail", "--set-level", "net"],
        ["devlink-tail", "--set-level", "=L_INFO"],
        ["devlink-tail", "--history", "PAGE"],
    ] {
        assert!(TailArgs::try_parse_from(bad).is_err(), "{bad:?}");
    }
}

/// **VALUE**: Verifies the verbose flag raises the log level.
///
/// **WHY THIS MATTERS**: Debug output shows every RPC exchange.
///
/// **BUG THIS CATCHES**: Would catch `-v` being ignored.
#[test]
fn given_verbose_flag_when_log_level_read_then_debug() {
    let args = TailArgs::try_parse_from(["devlink-tail", "-v"]).unwrap();

    assert_eq!(args.log_level(), log::LevelFilter::Debug);
    assert!(args.log_dir().ends_with("devlink/logs"));
}
