//! The tail session: discover loggers over RPC, subscribe a log listener and
//! print traced lines until interrupted.

use crate::cli::TailArgs;
use crate::error::TailError;

use common::ErrorLocation;

use devlink_core::config::CoreConfig;
use devlink_core::listener::{
    Listener, ListenerRegistry, ListenerVariant, ManagedListener, NotificationKind,
};
use devlink_core::log_service;
use devlink_core::notifications::LogNotifications;
use devlink_core::rpc::RpcClient;
use devlink_core::transport::{Transport, WsTransport};

use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};

/// Owner name the log listener is registered under.
pub const DEVICE_OWNER: &str = "device";

pub async fn run(args: &TailArgs, config: CoreConfig) -> Result<(), TailError> {
    let endpoint = config.rpc_endpoint()?;
    let mut client = RpcClient::connect(endpoint)
        .await?
        .with_timeout(config.rpc_timeout());

    if args.list_loggers {
        print_loggers(&mut client).await?;
        client.close().await;
        return Ok(());
    }

    for (logger, level) in &args.set_levels {
        log_service::set_log_level(&mut client, logger, *level).await?;
    }

    let severity = args.severity.unwrap_or_else(|| config.severity_filter());
    let kind = LogNotifications::load(&mut client, severity).await?;
    let targets = select_loggers(&args.loggers, &kind.notif_types())?;

    let session = WsTransport::subscribe(&config.listener.publisher_address)?;
    let listener = Arc::new(Listener::new(
        "log",
        kind,
        session,
        config.listener_settings(),
    ));
    listener.set_trace_file(args.trace_file.clone());

    for logger in &targets {
        listener.register_notif_type(logger)?;
        listener.enable_trace(logger)?;
    }
    info!(
        "Tailing {} logger(s) from {} at severity {}",
        targets.len(),
        config.listener.publisher_address,
        severity.name()
    );

    let mut registry = ListenerRegistry::new();
    let managed: Arc<dyn ManagedListener> = listener.clone();
    registry.add_listeners(DEVICE_OWNER, [(managed, ListenerVariant::Log)]);

    tokio::signal::ctrl_c().await.map_err(|e| TailError::Tail {
        message: format!("Failed to wait for Ctrl-C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    info!("Interrupted, shutting down");

    if let Some(range) = args.history {
        for logger in &targets {
            match listener.format_messages(range, logger) {
                Ok(lines) => lines.iter().for_each(|line| println!("{line}")),
                Err(e) => warn!("No history for '{}': {}", logger, e),
            }
        }
    }

    registry.stop_all().await;
    listener.close().await;
    client.close().await;
    Ok(())
}

async fn print_loggers<T: Transport>(client: &mut RpcClient<T>) -> Result<(), TailError> {
    for logger in log_service::get_loggers(client).await? {
        let level = log_service::get_log_level(client, &logger).await?;
        println!("{logger}: {}", level.name());
    }
    Ok(())
}

/// Loggers to tail: the requested ones, or every known logger.
///
/// # Errors
///
/// Returns [`TailError::Tail`] if a requested logger is unknown to the device.
pub fn select_loggers(requested: &[String], known: &[String]) -> Result<Vec<String>, TailError> {
    if requested.is_empty() {
        return Ok(known.to_vec());
    }

    if let Some(unknown) = requested.iter().find(|name| !known.contains(name)) {
        return Err(TailError::Tail {
            message: format!(
                "Unknown logger '{unknown}' (device has: {})",
                known.join(", ")
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(requested.to_vec())
}
