pub mod config;
pub mod listener;
pub mod rpc_client;
pub mod transport;
