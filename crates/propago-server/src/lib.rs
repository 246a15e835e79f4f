#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod validate;
