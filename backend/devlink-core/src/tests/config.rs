use crate::config::{CONFIG_FILE_NAME, CoreConfig};
use crate::error::config::ConfigError;
use crate::proto::LogLevel;

use std::time::Duration;

use tempfile::TempDir;

fn write_config(contents: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), contents).expect("Failed to write config");
    dir
}

/// **VALUE**: Verifies a missing file yields the documented defaults.
///
/// **WHY THIS MATTERS**: First runs have no config file.
///
/// **BUG THIS CATCHES**: Would catch a missing file being reported as an error
/// or defaults drifting from the documented values.
#[test]
fn given_no_config_file_when_loaded_then_defaults() {
    let dir = TempDir::new().unwrap();

    let config = CoreConfig::load_from_dir(dir.path()).unwrap();

    assert_eq!(config, CoreConfig::default());
    let settings = config.listener_settings();
    assert_eq!(settings.inpq_max_size, 1000);
    assert_eq!(settings.inpq_threshold, 100);
    assert_eq!(settings.poll_timeout, Duration::from_millis(1000));
    assert_eq!(settings.inbox_size, 100);
    assert_eq!(settings.page_size, 25);
    assert_eq!(config.rpc_timeout(), Duration::from_millis(10_000));
    assert_eq!(config.severity_filter(), LogLevel::Fatal);
}

/// **VALUE**: Verifies a partial file overrides only what it names.
///
/// **WHY THIS MATTERS**: Users write the one setting they care about.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` turning a
/// partial file into a parse error.
#[test]
fn given_partial_config_when_loaded_then_rest_defaulted() {
    let dir = write_config(
        r#"
[rpc]
address = "ws://10.0.0.2:9000/rpc"
identity = "bench-1"

[listener]
inpq_threshold = 50

[log]
severity_filter = "L_ERROR"

[[notifications]]
name = "link_up"
id = 257
"#,
    );

    let config = CoreConfig::load_from_dir(dir.path()).unwrap();

    assert_eq!(config.rpc.service, "logger");
    assert_eq!(config.listener.inpq_threshold, 50);
    assert_eq!(config.listener.inpq_max_size, 1000);
    assert_eq!(config.severity_filter(), LogLevel::Error);
    assert_eq!(config.catalog().unwrap().id("link_up"), Some(257));

    let endpoint = config.rpc_endpoint().unwrap();
    assert_eq!(endpoint.identity(), "bench-1");
}

/// **VALUE**: Verifies broken TOML is a parse error, not defaults.
///
/// **WHY THIS MATTERS**: Silently ignoring a broken file would connect to
/// the wrong device.
///
/// **BUG THIS CATCHES**: Would catch parse failures falling back to defaults.
#[test]
fn given_invalid_toml_when_loaded_then_parse_error() {
    let dir = write_config("[rpc\naddress = ");

    let err = CoreConfig::load_from_dir(dir.path()).unwrap_err();

    assert!(matches!(err, ConfigError::ParseError { .. }), "{err}");
}

/// **VALUE**: Verifies queue limits and addresses are validated.
///
/// **WHY THIS MATTERS**: A threshold above the max size disables the soft
/// overflow; a zero size aborts on the first notification.
///
/// **BUG THIS CATCHES**: Would catch each invalid value slipping through.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    let mut threshold_above_max = CoreConfig::default();
    threshold_above_max.listener.inpq_threshold = 2000;

    let mut zero_inbox = CoreConfig::default();
    zero_inbox.listener.inbox_size = 0;

    let mut http_address = CoreConfig::default();
    http_address.rpc.address = "http://127.0.0.1:9000".to_string();

    let mut bad_level = CoreConfig::default();
    bad_level.log.severity_filter = "loud".to_string();

    for config in [threshold_above_max, zero_inbox, http_address, bad_level] {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}

/// **VALUE**: Verifies configured addresses are limited to schemes the
/// session constructors can open.
///
/// **WHY THIS MATTERS**: A config that validates must not fail later when
/// the RPC client or the listener session is built from it.
///
/// **BUG THIS CATCHES**: Would catch an in-process `mem://` address passing
/// validation and then being rejected at connect time.
#[test]
fn given_in_process_address_when_validated_then_rejected() {
    let mut mem_rpc = CoreConfig::default();
    mem_rpc.rpc.address = "mem://device".to_string();

    let mut mem_publisher = CoreConfig::default();
    mem_publisher.listener.publisher_address = "mem://device/log".to_string();

    for config in [mem_rpc, mem_publisher] {
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mem://"), "{err}");
    }

    let mut secure = CoreConfig::default();
    secure.rpc.address = "wss://device.local:9000/rpc".to_string();
    secure.validate().expect("wss address is accepted");
}
