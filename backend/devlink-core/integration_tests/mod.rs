mod helpers;
mod listener;
mod overflow;
mod registry;
mod rpc;
mod ws_transport;
