//! Test helpers for devlink-core integration tests.
//!
//! This module provides utilities for:
//! - Building RPC replies and notification messages
//! - Listener settings with short poll intervals
//! - Polling for asynchronous conditions
//! - A dispatcher gate that pauses a listener's dispatch task
//! - A WebSocket device stand-in

use devlink_core::listener::{ListenerSettings, TraceCallback};
use devlink_core::notifications::LogNotifications;
use devlink_core::proto::{LogEvent, LogLevel};
use devlink_core::rpc::RPC_CLIENT_PROTOCOL;
use devlink_core::transport::Multipart;
use devlink_core::transport::frame::{decode_multipart, encode_multipart};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use prost::Message as ProstMessage;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

pub const TEST_SERVICE: &str = "logger";

/// Test helper: Listener settings polling every 20 ms.
pub fn test_settings() -> ListenerSettings {
    ListenerSettings {
        poll_timeout: Duration::from_millis(20),
        ..ListenerSettings::default()
    }
}

/// Test helper: Reply envelope carrying a result code and payload.
pub fn reply(service: &str, command: u8, code: u32, payload: &[u8]) -> Multipart {
    vec![
        RPC_CLIENT_PROTOCOL.as_bytes().to_vec(),
        service.as_bytes().to_vec(),
        vec![command],
        code.to_be_bytes().to_vec(),
        payload.to_vec(),
    ]
}

pub fn log_event(logger: &str, level: LogLevel, msg: &str) -> LogEvent {
    LogEvent {
        logger: logger.to_string(),
        msg: msg.to_string(),
        timestamp: 1_700_000_000_000_000,
        log_level: level as i32,
        location: String::new(),
    }
}

/// Test helper: Log notification as published by the device.
pub fn log_notification(logger: &str, level: LogLevel, msg: &str) -> Multipart {
    vec![
        logger.as_bytes().to_vec(),
        log_event(logger, level, msg).encode_to_vec(),
    ]
}

pub fn log_kind(loggers: &[&str]) -> LogNotifications {
    LogNotifications::new(
        loggers.iter().map(|l| l.to_string()).collect(),
        LogLevel::Fatal,
    )
}

/// Test helper: Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Trace callback that blocks the dispatch task until released.
#[derive(Clone, Default)]
pub struct DispatchGate {
    entered: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl DispatchGate {
    pub fn callback<Id, R>(&self) -> Arc<dyn Fn(&Id, &R) + Send + Sync>
    where
        Id: 'static,
        R: 'static,
    {
        let gate = self.clone();
        Arc::new(move |_: &Id, _: &R| {
            gate.entered.fetch_add(1, Ordering::SeqCst);
            let deadline = Instant::now() + Duration::from_secs(10);
            while !gate.released.load(Ordering::SeqCst) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(2));
            }
        })
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Trace callback that records every traced message text.
pub fn recording_callback(
    seen: Arc<Mutex<Vec<String>>>,
) -> TraceCallback<LogNotifications> {
    Arc::new(move |_: &String, event: &LogEvent| {
        seen.lock().unwrap().push(event.msg.clone());
    })
}

/// A WebSocket stand-in for the device.
pub struct TestDevice {
    pub address: String,
    /// Identity header sent by the last client.
    pub identity: Arc<Mutex<Option<String>>>,
    pub handle: JoinHandle<()>,
}

/// Test helper: Start a WebSocket server on a free port.
///
/// Every connection first receives `publish` (one binary message each), then
/// each request is answered by `respond`.
pub async fn start_test_device(
    publish: Vec<Multipart>,
    respond: fn(Multipart) -> Option<Multipart>,
) -> TestDevice {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test device");
    let port = listener.local_addr().expect("No local address").port();
    let identity = Arc::new(Mutex::new(None));

    let seen_identity = Arc::clone(&identity);
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen_identity = Arc::clone(&seen_identity);
            let capture = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                let header = request
                    .headers()
                    .get("x-devlink-identity")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                *seen_identity.lock().unwrap() = header;
                Ok(response)
            };

            let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, capture).await else {
                continue;
            };

            for message in &publish {
                let _ = ws
                    .send(Message::Binary(encode_multipart(message).into()))
                    .await;
            }

            tokio::spawn(async move {
                while let Some(Ok(message)) = ws.next().await {
                    let Message::Binary(data) = message else {
                        continue;
                    };
                    let Ok(request) = decode_multipart(&data) else {
                        continue;
                    };
                    if let Some(answer) = respond(request) {
                        let _ = ws
                            .send(Message::Binary(encode_multipart(&answer).into()))
                            .await;
                    }
                }
            });
        }
    });

    TestDevice {
        address: format!("ws://127.0.0.1:{port}/"),
        identity,
        handle,
    }
}
