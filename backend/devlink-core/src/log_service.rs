//! Calls into the device's log service: logger discovery and level control.

use crate::error::rpc_client::RpcClientError;
use crate::proto::log_command::{GET_LOG_LEVEL, GET_LOGGERS, SET_LOG_LEVEL};
use crate::proto::{
    GetLogLevelResponse, GetLoggerRequest, GetLoggersResponse, LogLevel, SetLogLevelRequest,
};
use crate::rpc::RpcClient;
use crate::transport::Transport;

use log::info;

/// Service name the log worker registers under.
pub const LOG_RPC_SERVICE: &str = "logger";

/// Names of every logger known to the device.
pub async fn get_loggers<T: Transport>(
    client: &mut RpcClient<T>,
) -> Result<Vec<String>, RpcClientError> {
    let response: GetLoggersResponse = client
        .send_structured(GET_LOGGERS, None::<&()>, Some(LOG_RPC_SERVICE), None)
        .await?;
    Ok(response.loggers)
}

pub async fn get_log_level<T: Transport>(
    client: &mut RpcClient<T>,
    logger: &str,
) -> Result<LogLevel, RpcClientError> {
    let request = GetLoggerRequest {
        logger: logger.to_string(),
    };
    let response: GetLogLevelResponse = client
        .send_structured(GET_LOG_LEVEL, Some(&request), Some(LOG_RPC_SERVICE), None)
        .await?;
    Ok(response.log_level())
}

pub async fn set_log_level<T: Transport>(
    client: &mut RpcClient<T>,
    logger: &str,
    level: LogLevel,
) -> Result<(), RpcClientError> {
    let request = SetLogLevelRequest {
        logger: logger.to_string(),
        log_level: level as i32,
    };
    client
        .send_structured_raw(SET_LOG_LEVEL, Some(&request), Some(LOG_RPC_SERVICE), None)
        .await?;
    info!("Set log level of '{}' to {}", logger, level.name());
    Ok(())
}
