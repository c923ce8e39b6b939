use crate::error::config::ConfigError;
use crate::error::rpc_client::RpcClientError;
use crate::listener::{
    DEFAULT_INBOX_SIZE, DEFAULT_INPQ_MAX_SIZE, DEFAULT_INPQ_THRESHOLD, DEFAULT_PAGE_SIZE,
    ListenerSettings,
};
use crate::log_service::LOG_RPC_SERVICE;
use crate::notifications::{NotificationCatalog, NotificationDef};
use crate::proto::LogLevel;
use crate::rpc::ServerEndpoint;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "devlink.toml";

const ADDRESS_SCHEMES: [&str; 2] = ["ws://", "wss://"];

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_address")]
    pub address: String,
    #[serde(default = "default_service")]
    pub service: String,
    pub identity: Option<String>,
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            address: default_rpc_address(),
            service: default_service(),
            identity: None,
            timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfig {
    #[serde(default = "default_publisher_address")]
    pub publisher_address: String,
    #[serde(default = "default_inpq_max_size")]
    pub inpq_max_size: usize,
    #[serde(default = "default_inpq_threshold")]
    pub inpq_threshold: usize,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_inbox_size")]
    pub inbox_size: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            publisher_address: default_publisher_address(),
            inpq_max_size: default_inpq_max_size(),
            inpq_threshold: default_inpq_threshold(),
            poll_timeout_ms: default_poll_timeout_ms(),
            inbox_size: default_inbox_size(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Events at this level or more severe bypass subscriptions.
    #[serde(default = "default_severity_filter")]
    pub severity_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            severity_filter: default_severity_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub notifications: Vec<NotificationDef>,
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_rpc_address() -> String {
    "ws://127.0.0.1:9000/rpc".to_string()
}
fn default_service() -> String {
    LOG_RPC_SERVICE.to_string()
}
fn default_rpc_timeout_ms() -> u64 {
    10_000
}
fn default_publisher_address() -> String {
    "ws://127.0.0.1:9100/notifications".to_string()
}
fn default_inpq_max_size() -> usize {
    DEFAULT_INPQ_MAX_SIZE
}
fn default_inpq_threshold() -> usize {
    DEFAULT_INPQ_THRESHOLD
}
fn default_poll_timeout_ms() -> u64 {
    1000
}
fn default_inbox_size() -> usize {
    DEFAULT_INBOX_SIZE
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_severity_filter() -> String {
    "fatal".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl CoreConfig {
    /// Load config from `path`.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file does not exist.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let config: CoreConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Load `devlink.toml` from `config_dir`.
    pub fn load_from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&config_dir.join(CONFIG_FILE_NAME))
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, address) in [
            ("rpc.address", &self.rpc.address),
            ("listener.publisher_address", &self.listener.publisher_address),
        ] {
            if !ADDRESS_SCHEMES
                .iter()
                .any(|scheme| address.starts_with(scheme))
            {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Invalid {field}: {address} (expected ws:// or wss://)"),
                });
            }
        }

        if self.rpc.service.is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "rpc.service cannot be empty".to_string(),
            });
        }

        for (field, value) in [
            ("rpc.timeout_ms", self.rpc.timeout_ms),
            ("listener.poll_timeout_ms", self.listener.poll_timeout_ms),
            ("listener.inpq_max_size", self.listener.inpq_max_size as u64),
            ("listener.inpq_threshold", self.listener.inpq_threshold as u64),
            ("listener.inbox_size", self.listener.inbox_size as u64),
            ("listener.page_size", self.listener.page_size as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("{field} must be greater than 0"),
                });
            }
        }

        if self.listener.inpq_threshold > self.listener.inpq_max_size {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "listener.inpq_threshold {} exceeds listener.inpq_max_size {}",
                    self.listener.inpq_threshold, self.listener.inpq_max_size
                ),
            });
        }

        if LogLevel::from_name(&self.log.severity_filter).is_none() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid log.severity_filter: {}", self.log.severity_filter),
            });
        }

        self.catalog()?;
        Ok(())
    }

    pub fn rpc_endpoint(&self) -> Result<ServerEndpoint, RpcClientError> {
        ServerEndpoint::new(
            &self.rpc.address,
            &self.rpc.service,
            self.rpc.identity.clone(),
        )
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.timeout_ms)
    }

    pub fn listener_settings(&self) -> ListenerSettings {
        ListenerSettings {
            inpq_max_size: self.listener.inpq_max_size,
            inpq_threshold: self.listener.inpq_threshold,
            poll_timeout: Duration::from_millis(self.listener.poll_timeout_ms),
            inbox_size: self.listener.inbox_size,
            page_size: self.listener.page_size,
        }
    }

    /// Falls back to `Fatal` for unrecognised names.
    pub fn severity_filter(&self) -> LogLevel {
        LogLevel::from_name(&self.log.severity_filter).unwrap_or(LogLevel::Fatal)
    }

    pub fn catalog(&self) -> Result<NotificationCatalog, ConfigError> {
        NotificationCatalog::from_defs(&self.notifications)
    }
}
