use crate::error::TailError;

use common::ErrorLocation;

use devlink_core::config::CONFIG_FILE_NAME;
use devlink_core::listener::HistoryRange;
use devlink_core::proto::LogLevel;

use std::panic::Location;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

const APP_DIR_NAME: &str = "devlink";

/// Tail a device's log stream.
#[derive(Debug, Parser)]
#[command(name = "devlink-tail", version)]
pub struct TailArgs {
    /// Config file (default: <config dir>/devlink/devlink.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for devlink-tail.log (default: <data dir>/devlink/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Logger to tail; repeat for several. Tails every logger when omitted.
    #[arg(long = "logger", value_name = "NAME")]
    pub loggers: Vec<String>,

    /// Keep and show events at this level or more severe from every logger
    #[arg(long, value_parser = parse_level)]
    pub severity: Option<LogLevel>,

    /// Also append traced lines to this file
    #[arg(long)]
    pub trace_file: Option<PathBuf>,

    /// Set a logger's level before tailing, as NAME=LEVEL
    #[arg(long = "set-level", value_name = "NAME=LEVEL", value_parser = parse_level_assignment)]
    pub set_levels: Vec<(String, LogLevel)>,

    /// Print the device's loggers with their levels and exit
    #[arg(long)]
    pub list_loggers: bool,

    /// On exit, print this part of each tailed logger's history (ALL, LAST n, PAGE k, RANGE a b)
    #[arg(long, value_parser = parse_history)]
    pub history: Option<HistoryRange>,

    /// Log debug output of devlink itself
    #[arg(short, long)]
    pub verbose: bool,
}

impl TailArgs {
    pub fn config_path(&self) -> Result<PathBuf, TailError> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| TailError::Tail {
                message: "No config directory on this platform; pass --config".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME)
                .join("logs")
        })
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            crate::logger::DEFAULT_LOG_LEVEL
        }
    }
}

fn parse_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::from_name(value).ok_or_else(|| format!("unknown log level '{value}'"))
}

fn parse_level_assignment(value: &str) -> Result<(String, LogLevel), String> {
    let (name, level) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=LEVEL, got '{value}'"))?;
    if name.is_empty() {
        return Err(format!("missing logger name in '{value}'"));
    }
    Ok((name.to_string(), parse_level(level)?))
}

fn parse_history(value: &str) -> Result<HistoryRange, String> {
    value.parse().map_err(|e: devlink_core::error::listener::ListenerError| e.to_string())
}
