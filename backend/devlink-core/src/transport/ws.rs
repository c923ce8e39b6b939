//! WebSocket transport session.
//!
//! Every multipart message travels as one binary WebSocket message packed by
//! [`frame`](crate::transport::frame). Text and control messages are skipped;
//! a close frame ends the session.

use crate::error::transport::TransportError;
use crate::transport::frame::{decode_multipart, encode_multipart};
use crate::transport::{Multipart, SessionMode, Transport};

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::time::timeout as TokioTimeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Handshake header carrying the client identity of a request session.
pub const IDENTITY_HEADER: &str = "x-devlink-identity";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsTransport {
    address: String,
    mode: SessionMode,
    identity: Option<String>,
    stream: Option<WsStream>,
}

impl WsTransport {
    /// Create an unconnected session. The address must be a `ws://` or `wss://` URL.
    pub fn new(
        address: &str,
        mode: SessionMode,
        identity: Option<String>,
    ) -> Result<Self, TransportError> {
        let url = url::Url::parse(address)?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(TransportError::Address {
                message: format!("Unsupported scheme '{}' in {address}", url.scheme()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self {
            address: address.to_string(),
            mode,
            identity,
            stream: None,
        })
    }

    pub fn request(address: &str, identity: Option<String>) -> Result<Self, TransportError> {
        Self::new(address, SessionMode::Request, identity)
    }

    pub fn subscribe(address: &str) -> Result<Self, TransportError> {
        Self::new(address, SessionMode::Subscribe, None)
    }

    async fn next_multipart(&mut self) -> Result<Multipart, TransportError> {
        loop {
            let stream = self.stream.as_mut().ok_or_else(|| TransportError::NotConnected {
                message: format!("Session to {} is not connected", self.address),
                location: ErrorLocation::from(Location::caller()),
            })?;

            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return decode_multipart(&data),
                Some(Ok(Message::Close(_))) | None => {
                    self.stream = None;
                    return Err(TransportError::Closed {
                        message: format!("Peer {} closed the session", self.address),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Some(Ok(other)) => {
                    debug!("Ignoring non-binary message from {}: {:?}", self.address, other);
                }
                Some(Err(e)) => {
                    self.stream = None;
                    return Err(TransportError::Receive {
                        message: format!("Error reading from {}: {e}", self.address),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }
    }
}

impl Transport for WsTransport {
    fn address(&self) -> &str {
        &self.address
    }

    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let mut request = self
            .address
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect {
                address: self.address.clone(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if let (SessionMode::Request, Some(identity)) = (self.mode, &self.identity) {
            let value = HeaderValue::from_str(identity).map_err(|e| TransportError::Connect {
                address: self.address.clone(),
                message: format!("Invalid identity '{identity}': {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
            request.headers_mut().insert(IDENTITY_HEADER, value);
        }

        let (stream, _response) =
            connect_async(request)
                .await
                .map_err(|e| TransportError::Connect {
                    address: self.address.clone(),
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        info!("Connected {:?} session to {}", self.mode, self.address);
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, message: Multipart) -> Result<(), TransportError> {
        if self.mode == SessionMode::Subscribe {
            return Err(TransportError::Send {
                message: format!("Session to {} is subscribe-only", self.address),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let stream = self.stream.as_mut().ok_or_else(|| TransportError::NotConnected {
            message: format!("Session to {} is not connected", self.address),
            location: ErrorLocation::from(Location::caller()),
        })?;

        stream
            .send(Message::Binary(encode_multipart(&message).into()))
            .await
            .map_err(|e| TransportError::Send {
                message: format!("Failed to send to {}: {e}", self.address),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Multipart>, TransportError> {
        match TokioTimeout(timeout, self.next_multipart()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                warn!("Error closing session to {}: {}", self.address, e);
            }
            info!("Disconnected from {}", self.address);
        }
    }
}
