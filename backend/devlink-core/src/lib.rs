//! Client runtime for a device's control protocol and notification feed.
//!
//! - [`rpc`] - synchronous remote calls with timeout and reconnect
//! - [`listener`] - notification listeners with bounded history and
//!   overload handling, plus a registry of them per owning process
//! - [`notifications`] - concrete notification kinds
//! - [`transport`] - the sessions both of the above run over

pub mod config;
pub mod error;
pub mod listener;
pub mod log_service;
pub mod notifications;
pub mod proto;
pub mod rpc;
pub mod transport;

#[cfg(test)]
mod tests;
