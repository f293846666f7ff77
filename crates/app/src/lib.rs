#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub mod telemetry;
