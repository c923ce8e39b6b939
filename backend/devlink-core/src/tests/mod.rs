mod catalog;
mod config;
mod envelope;
mod frame;
mod history;
mod log_format;
