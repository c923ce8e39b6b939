use devlink_tail::cli::TailArgs;
use devlink_tail::error::TailError;
use devlink_tail::logger::initialize as LoggerInitialize;
use devlink_tail::tail;

use common::ErrorLocation;

use devlink_core::config::CoreConfig;

use std::fs::create_dir_all;
use std::panic::Location;

use clap::Parser;
use log::info;

#[tokio::main]
async fn main() -> Result<(), TailError> {
    let args = TailArgs::parse();

    let log_dir = args.log_dir();
    create_dir_all(&log_dir).map_err(|e| TailError::Tail {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, args.log_level())?;

    info!("devlink-tail starting");
    info!("Log directory: {}", log_dir.display());

    let config = CoreConfig::load(&args.config_path()?)?;

    tail::run(&args, config).await
}
