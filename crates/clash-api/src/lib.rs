// clash-api: Async Rust client for the Clash external-controller API

pub mod client;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

mod configs;
mod proxies;
mod rules;

pub use client::Client;
pub use error::Error;
pub use models::{
    Config, LogLevel, LogRecord, Proxy, ProxyCollection, ProxyDelay, ProxyType, Rule, Traffic,
};
pub use stream::{LogStream, RecordStream, TrafficStream};
pub use transport::TransportConfig;
