// dims - signed on-the-fly image transformation gateway
// Module declarations

pub mod app;
pub mod codec;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod lambda;
pub mod logging;
pub mod protocol;
pub mod proxy;
pub mod request;
pub mod server;
pub mod signing;
pub mod source;
pub mod watermark;
