use crate::error::rpc_client::{RpcClientError, TIMEOUT_RETRY_CODE};
use crate::rpc::envelope::{build_request, parse_reply};
use crate::rpc::{DEFAULT_RPC_TIMEOUT, RpcReply, ServerEndpoint};
use crate::transport::{Transport, WsTransport};

use common::{AuthBlob, ErrorLocation};

use std::panic::Location;
use std::time::Duration;

use log::{debug, error, info, warn};
use prost::Message as ProstMessage;

/// Client for the request/reply control protocol.
///
/// Owns its session exclusively. All calls take `&mut self`, so at most one
/// request is ever outstanding on the session.
pub struct RpcClient<T: Transport = WsTransport> {
    endpoint: ServerEndpoint,
    transport: T,
    timeout: Duration,
}

impl RpcClient<WsTransport> {
    /// Connect a WebSocket request session to `endpoint`.
    pub async fn connect(endpoint: ServerEndpoint) -> Result<Self, RpcClientError> {
        let transport =
            WsTransport::request(endpoint.address(), Some(endpoint.identity().to_string()))?;
        Self::with_transport(endpoint, transport).await
    }
}

impl<T: Transport> RpcClient<T> {
    /// Wrap an existing session and open it.
    pub async fn with_transport(
        endpoint: ServerEndpoint,
        mut transport: T,
    ) -> Result<Self, RpcClientError> {
        transport.connect().await?;
        info!(
            "RPC client connected to {} (service '{}')",
            endpoint.address(),
            endpoint.service()
        );

        Ok(Self {
            endpoint,
            transport,
            timeout: DEFAULT_RPC_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn default_service(&self) -> &str {
        self.endpoint.service()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close and reopen the session.
    pub async fn reconnect(&mut self) -> Result<(), RpcClientError> {
        self.transport.close().await;
        self.transport.connect().await?;
        Ok(())
    }

    pub async fn close(&mut self) {
        self.transport.close().await;
        info!("RPC client disconnected from {}", self.endpoint.address());
    }

    /// Send one command and wait for its reply.
    ///
    /// `service` defaults to the endpoint's service. `auth`, when present, is
    /// appended after the payload.
    ///
    /// # Errors
    ///
    /// - [`RpcClientError::Timeout`] - no reply within the timeout; the session
    ///   has been reopened and the call may be repeated
    /// - [`RpcClientError::Protocol`] - the reply envelope is malformed or
    ///   answers another command; the session is reopened in the latter case
    /// - [`RpcClientError::Transport`] - the session failed, including a failed
    ///   reopen after a timeout
    pub async fn send(
        &mut self,
        command: u8,
        payload: Vec<u8>,
        service: Option<&str>,
        auth: Option<&AuthBlob>,
    ) -> Result<RpcReply, RpcClientError> {
        let service = service.unwrap_or(self.endpoint.service()).to_string();

        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }

        debug!("Sending request to service={}, cmd={}", service, command);
        self.transport
            .send(build_request(&service, command, payload, auth))
            .await?;

        let Some(parts) = self.transport.recv_timeout(self.timeout).await? else {
            warn!(
                "No reply from {} within {:?}, reconnecting",
                self.endpoint.address(),
                self.timeout
            );
            self.reconnect().await.inspect_err(|e| {
                error!("Reconnect to {} failed: {}", self.endpoint.address(), e)
            })?;
            return Err(RpcClientError::Timeout {
                code: TIMEOUT_RETRY_CODE,
                message: format!("No reply for service={service} cmd={command}"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let reply = parse_reply(parts, &service).inspect_err(|e| error!("{}", e))?;
        if reply.command != command {
            error!(
                "Reply for cmd={} while waiting for cmd={}, reconnecting {}",
                reply.command,
                command,
                self.endpoint.address()
            );
            self.reconnect().await?;
            return Err(RpcClientError::Protocol {
                message: format!(
                    "Out of sequence reply: expected cmd={command}, got cmd={}",
                    reply.command
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        debug!(
            "Received response for service={} cmd={}",
            service, reply.command
        );
        Ok(reply)
    }

    /// Send a protobuf request and decode the protobuf response.
    ///
    /// A `None` request sends an empty payload.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError::Rpc`] with the server's result code when it is
    /// non-zero, plus everything [`send`](Self::send) can return.
    pub async fn send_structured<Req, Resp>(
        &mut self,
        command: u8,
        request: Option<&Req>,
        service: Option<&str>,
        auth: Option<&AuthBlob>,
    ) -> Result<Resp, RpcClientError>
    where
        Req: ProstMessage,
        Resp: ProstMessage + Default,
    {
        let payload = self
            .send_structured_raw(command, request, service, auth)
            .await?;
        Ok(Resp::decode(payload.as_slice())?)
    }

    /// Like [`send_structured`](Self::send_structured) but returns the raw
    /// response payload instead of decoding it.
    pub async fn send_structured_raw<Req>(
        &mut self,
        command: u8,
        request: Option<&Req>,
        service: Option<&str>,
        auth: Option<&AuthBlob>,
    ) -> Result<Vec<u8>, RpcClientError>
    where
        Req: ProstMessage,
    {
        let payload = request.map(|r| r.encode_to_vec()).unwrap_or_default();
        let reply = self.send(command, payload, service, auth).await?;

        let result_code = reply.result_code()?;
        if result_code.is_ok() {
            return Ok(reply.payload().to_vec());
        }

        let payload = reply.payload().to_vec();
        Err(RpcClientError::Rpc {
            result_code,
            message: String::from_utf8_lossy(&payload).into_owned(),
            payload,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
