//! Transport sessions: discrete multipart messages over a named endpoint.
//!
//! A session is either a request session (send then wait for one reply) or a
//! subscribe session (receive only). The RPC client and every notification
//! listener own exactly one session each; sessions are never shared.
//!
//! Two implementations ship with the crate:
//!
//! - [`WsTransport`] - WebSocket binary frames (`ws://` / `wss://` addresses)
//! - [`MemoryTransport`] - in-process channel pair (`mem://` addresses)

pub mod frame;
pub mod memory;
pub mod ws;

pub use memory::{MemoryPeer, MemoryTransport};
pub use ws::WsTransport;

use crate::error::transport::TransportError;

use std::future::Future;
use std::time::Duration;

/// One message made of ordered parts (frames).
pub type Multipart = Vec<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Bidirectional request/reply session.
    Request,
    /// Receive-only session fed by a publisher.
    Subscribe,
}

/// A connection to one endpoint that moves whole multipart messages.
pub trait Transport: Send + 'static {
    fn address(&self) -> &str;

    fn mode(&self) -> SessionMode;

    fn is_connected(&self) -> bool;

    /// Open the session. Calling this on an open session is a no-op.
    fn connect(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send(
        &mut self,
        message: Multipart,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait up to `timeout` for one inbound message.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. The wait is cancel-safe.
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Multipart>, TransportError>> + Send;

    /// Tear the session down, discarding anything not yet received.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
