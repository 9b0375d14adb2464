use thiserror::Error;

/// Top-level error type for the `clash-api` crate.
///
/// Covers transport failures, undecodable controller responses, broken
/// stream framing, and the rejections returned by mutating endpoints.
/// Clean termination of a record stream is not an error.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, timeout, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured host does not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured host parses, but cannot carry a path.
    #[error("Invalid controller host: {0}")]
    InvalidHost(String),

    // ── Controller responses ────────────────────────────────────────
    /// The controller rejected the bearer token.
    #[error("Unauthorized -- check the controller secret")]
    Unauthorized,

    /// Non-success status whose body is not the expected payload.
    #[error("Controller error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed, with the raw body (or line) for debugging.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, body: String },

    /// A streamed record grew past the framing limit without a newline.
    #[error("Stream line exceeded {limit} bytes without a terminator")]
    LineTooLong { limit: usize },

    // ── Rejected mutations ──────────────────────────────────────────
    /// `PUT /proxies/{group}` did not answer 200.
    #[error("Proxy selection rejected: {message}")]
    SelectionRejected { status: u16, message: String },

    /// `PATCH /configs` did not answer 204.
    #[error("Configuration update rejected (HTTP {status}): {message}")]
    ConfigRejected { status: u16, message: String },

    /// `PUT /configs` did not answer 200.
    #[error("Configuration reload rejected (HTTP {status}): {message}")]
    ReloadRejected { status: u16, message: String },
}

impl Error {
    /// Build a `MalformedResponse` from a serde error and the offending text.
    pub(crate) fn malformed(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::MalformedResponse {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }

    /// Returns `true` if the transport gave up waiting on the controller.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` for the mutation rejections (select, patch, reload).
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::SelectionRejected { .. } | Self::ConfigRejected { .. } | Self::ReloadRejected { .. }
        )
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized => Some(401),
            Self::Api { status, .. }
            | Self::SelectionRejected { status, .. }
            | Self::ConfigRejected { status, .. }
            | Self::ReloadRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
