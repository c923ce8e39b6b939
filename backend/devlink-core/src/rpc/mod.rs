//! Synchronous remote calls over a request session.
//!
//! Every call is one request envelope followed by exactly one reply envelope:
//!
//! ```text
//! request: [ "RPCC01", service, [command], payload, (auth) ]
//! reply:   [ "RPCC01", service, [command], result_code (u32 BE), payload... ]
//! ```
//!
//! The client never pipelines. A reply that does not arrive within the
//! timeout causes the session to be closed and reopened before
//! [`RpcClientError::Timeout`](crate::error::rpc_client::RpcClientError::Timeout)
//! is returned.

mod client;
mod endpoint;
pub(crate) mod envelope;

pub use client::RpcClient;
pub use endpoint::ServerEndpoint;
pub use envelope::RpcReply;

use std::time::Duration;

/// Protocol tag opening every client envelope.
pub const RPC_CLIENT_PROTOCOL: &str = "RPCC01";

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(10_000);
