use crate::error::listener::ListenerError;
use crate::error::rpc_client::RpcClientError;
use crate::listener::NotificationKind;
use crate::log_service;
use crate::proto::{LogEvent, LogLevel};
use crate::rpc::RpcClient;
use crate::transport::Transport;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use prost::Message as ProstMessage;

/// Log events keyed by logger name.
///
/// Events at or above the severity filter are kept and traced even when
/// their logger is not subscribed.
pub struct LogNotifications {
    loggers: RwLock<Vec<String>>,
    severity_filter: LogLevel,
}

impl LogNotifications {
    pub fn new(loggers: Vec<String>, severity_filter: LogLevel) -> Self {
        Self {
            loggers: RwLock::new(loggers),
            severity_filter,
        }
    }

    /// Ask the device's log service for its loggers.
    pub async fn load<T: Transport>(
        client: &mut RpcClient<T>,
        severity_filter: LogLevel,
    ) -> Result<Self, RpcClientError> {
        let loggers = log_service::get_loggers(client).await?;
        Ok(Self::new(loggers, severity_filter))
    }

    /// Replace the cached logger names.
    pub fn set_loggers(&self, loggers: Vec<String>) {
        *self.loggers.write().unwrap_or_else(PoisonError::into_inner) = loggers;
    }

    pub fn severity_filter(&self) -> LogLevel {
        self.severity_filter
    }
}

impl NotificationKind for LogNotifications {
    type Id = String;
    type Record = LogEvent;

    fn notif_types(&self) -> Vec<String> {
        self.loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup_notif_id(&self, name: &str) -> Result<String, ListenerError> {
        Ok(name.to_string())
    }

    fn notif_name(&self, id: &String) -> String {
        id.clone()
    }

    #[track_caller]
    fn deserialize_notif_id(&self, frame: &[u8]) -> Result<String, ListenerError> {
        String::from_utf8(frame.to_vec()).map_err(|e| ListenerError::Decode {
            message: format!("logger name is not UTF-8: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn decode(&self, _id: &String, payload: &[u8]) -> Result<LogEvent, ListenerError> {
        Ok(LogEvent::decode(payload)?)
    }

    fn bypasses_filter(&self, record: &LogEvent) -> bool {
        record.log_level <= self.severity_filter as i32
    }

    fn format_record(&self, record: &LogEvent) -> String {
        format_log_event(record)
    }

    fn format_message(&self, index: u64, _id: &String, record: &LogEvent) -> String {
        format!("{} - {}", index + 1, format_log_event(record))
    }
}

/// `{date} {HH:MM:SS.mmm} {logger} {LEVEL}: {msg}`.
///
/// The timestamp renders in UTC, not the host's local zone. Negative
/// timestamps clamp to the epoch.
pub fn format_log_event(event: &LogEvent) -> String {
    let micros = u64::try_from(event.timestamp).unwrap_or(0);
    let stamp =
        humantime::format_rfc3339_millis(SystemTime::UNIX_EPOCH + Duration::from_micros(micros))
            .to_string();
    let (date, time) = stamp.split_once('T').unwrap_or((stamp.as_str(), ""));
    let time = time.trim_end_matches('Z');

    let level = LogLevel::try_from(event.log_level)
        .map(|level| level.name().to_string())
        .unwrap_or_else(|_| format!("L_{}", event.log_level));

    format!("{} {} {} {}: {}", date, time, event.logger, level, event.msg)
}
