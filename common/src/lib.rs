//! Shared building blocks for devlink.
//!
//! This crate holds the small value types every other crate in the workspace
//! leans on. There is no I/O here.
//!
//! ## Architecture
//!
//! - **common** (this crate): error locations, result codes, auth payloads
//! - **devlink-core**: transport, RPC client, notification listeners
//! - **devlink-tail**: binary wiring logging, config and a log listener

pub mod auth_blob;
pub mod error;
pub mod result_code;

#[cfg(test)]
mod tests;

pub use auth_blob::AuthBlob;
pub use error::auth_blob_error::AuthBlobError;
pub use error::error_location::ErrorLocation;
pub use result_code::ResultCode;
