// Controller HTTP client
//
// Holds the target host, bearer token, and an injected `reqwest::Client`.
// Endpoint groups (proxies, configs, rules, streams) are implemented as
// inherent methods in separate files; this module only deals with URL
// construction, authentication, and turning responses into results.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorEnvelope;
use crate::transport::TransportConfig;

/// Async client for a Clash-style external controller.
///
/// Immutable after construction and holds no per-call state, so one
/// instance can serve any number of concurrent operations.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    host: String,
    token: SecretString,
    request_timeout: Option<Duration>,
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with a fresh transport from `transport`.
    ///
    /// `host` is either `host:port` (plain HTTP is assumed) or a base URL
    /// with a scheme. Neither argument is validated here.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            host: host.into(),
            token: token.into(),
            request_timeout: transport.request_timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_http(
        host: impl Into<String>,
        token: impl Into<SecretString>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            host: host.into(),
            token: token.into(),
            request_timeout: None,
        }
    }

    /// The controller host as given at construction.
    pub fn host(&self) -> &str {
        &self.host
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Resolve `segments` against the host. Each segment is percent-encoded
    /// on its own, so names containing `/`, spaces, or emoji stay intact.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = if self.host.contains("://") {
            Url::parse(&self.host)?
        } else {
            Url::parse(&format!("http://{}", self.host))?
        };

        url.path_segments_mut()
            .map_err(|()| Error::InvalidHost(self.host.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    // ── Request construction ─────────────────────────────────────────

    /// Start an authenticated request. Query parameters and body are
    /// attached by the caller on the returned builder.
    pub fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.url(segments)?;
        debug!("{method} {url}");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(self.token.expose_secret()))
    }

    /// Like [`request`](Self::request), with the single-shot deadline applied.
    pub(crate) fn oneshot(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, Error> {
        let builder = self.request(method, segments)?;
        Ok(match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let resp = self.oneshot(Method::GET, segments)?.send().await?;
        decode(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self
            .oneshot(Method::GET, segments)?
            .query(params)
            .send()
            .await?;
        decode(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Decode a read response.
///
/// On a non-success status an error envelope with a message is returned as
/// `Error::Api` before the result type is tried. Any other body that
/// decodes is returned whatever the status. What is left becomes
/// `Error::Api` on a non-success status and `MalformedResponse` on a
/// success status.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }

    let body = resp.text().await?;
    if !status.is_success() {
        if let Some(message) = envelope_message(&body) {
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) if status.is_success() => Err(Error::malformed(&e, body)),
        Err(_) => Err(Error::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        }),
    }
}

/// Read the rest of a rejected response and extract its message.
pub(crate) async fn rejection(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "failed to read rejection body");
            String::new()
        }
    };
    (status.as_u16(), error_message(status, &body))
}

/// Non-empty message from an error envelope, if the body is one.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
}

/// Message from an error envelope, falling back to the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    envelope_message(body).unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> Client {
        Client::with_http(host, "secret".to_string(), reqwest::Client::new())
    }

    #[test]
    fn bare_host_defaults_to_http() {
        let url = client("127.0.0.1:9090").url(&["proxies"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9090/proxies");
    }

    #[test]
    fn base_url_with_prefix_is_kept() {
        let url = client("https://example.com/clash/").url(&["configs"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/clash/configs");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let url = client("localhost:9090")
            .url(&["proxy", "HK 01/fast", "delay"])
            .unwrap();
        assert_eq!(url.path(), "/proxy/HK%2001%2Ffast/delay");
    }

    #[test]
    fn unusable_host_is_reported() {
        assert!(matches!(
            client("mailto:ops?via=://").url(&["rules"]),
            Err(Error::InvalidHost(_))
        ));
        assert!(matches!(
            client("http://[::1").url(&["rules"]),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn request_carries_bearer_token() {
        let request = client("localhost:9090")
            .request(Method::GET, &["traffic"])
            .unwrap()
            .build()
            .unwrap();
        let auth = request.headers().get(reqwest::header::AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer secret");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn error_message_prefers_envelope() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"unknown proxy"}"#),
            "unknown proxy"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "not json"),
            "HTTP 404 Not Found"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":""}"#),
            "HTTP 400 Bad Request"
        );
    }

    #[test]
    fn debug_output_redacts_token() {
        let client = Client::with_http("localhost:9090", "tok-3f9a".to_string(), reqwest::Client::new());
        let rendered = format!("{client:?}");
        assert!(rendered.contains("localhost:9090"));
        assert!(!rendered.contains("tok-3f9a"));
    }
}
