//! Protobuf messages of the device's log service.
//!
//! Declared with `prost` derives so no `protoc` is needed at build time.

/// Log severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LogLevel {
    Fatal = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "L_FATAL",
            LogLevel::Error => "L_ERROR",
            LogLevel::Warn => "L_WARN",
            LogLevel::Info => "L_INFO",
            LogLevel::Debug => "L_DEBUG",
            LogLevel::Trace => "L_TRACE",
        }
    }

    /// Parse `fatal`, `L_FATAL`, `Fatal`, ... (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("L_").unwrap_or(&upper);
        match bare {
            "FATAL" => Some(LogLevel::Fatal),
            "ERROR" => Some(LogLevel::Error),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Log service command ids.
pub mod log_command {
    pub const GET_LOGGERS: u8 = 1;
    pub const GET_LOG_LEVEL: u8 = 2;
    pub const SET_LOG_LEVEL: u8 = 3;
}

/// One published log record.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LogEvent {
    #[prost(string, tag = "1")]
    pub logger: String,
    #[prost(string, tag = "2")]
    pub msg: String,
    /// Microseconds since the Unix epoch.
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
    #[prost(enumeration = "LogLevel", tag = "4")]
    pub log_level: i32,
    #[prost(string, tag = "5")]
    pub location: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetLoggersResponse {
    #[prost(string, repeated, tag = "1")]
    pub loggers: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetLoggerRequest {
    #[prost(string, tag = "1")]
    pub logger: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetLogLevelResponse {
    #[prost(enumeration = "LogLevel", tag = "1")]
    pub log_level: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SetLogLevelRequest {
    #[prost(string, tag = "1")]
    pub logger: String,
    #[prost(enumeration = "LogLevel", tag = "2")]
    pub log_level: i32,
}
