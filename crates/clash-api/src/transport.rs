// Transport configuration for building the reqwest::Client a `Client` owns.
//
// Nothing here is global: every `Client` carries its own transport handle,
// so timeouts can differ per controller and tests can inject their own.

use std::time::Duration;

/// Timeouts for the HTTP transport. All default to `None` (wait forever).
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Limit on establishing the TCP connection.
    pub connect_timeout: Option<Duration>,

    /// Limit on each individual body read. Applies to streams as well, so
    /// it should exceed the controller's emit interval.
    pub read_timeout: Option<Duration>,

    /// Total deadline for single-shot requests. Never applied to streams.
    pub request_timeout: Option<Duration>,
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("clash-api/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.read_timeout {
            builder = builder.read_timeout(timeout);
        }

        Ok(builder.build()?)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
