// Controller wire types
//
// Every value here is a request-scoped snapshot: decoded once, never
// mutated afterwards. Field names follow the controller's JSON keys via
// serde renames so the Rust side can use descriptive names.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ── Streams ──────────────────────────────────────────────────────────

/// One sample from `GET /traffic`: bytes transferred in the last interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub up: u64,
    pub down: u64,
}

impl fmt::Display for Traffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{2191} {} \u{2193} {}", self.up, self.down)
    }
}

/// Minimum severity requested from `GET /logs`, filtered server-side.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One line from `GET /logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub level: LogLevel,
    #[serde(rename = "payload")]
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level: {} {}", self.level, self.message)
    }
}

// ── Proxies ──────────────────────────────────────────────────────────

/// Adapter kind reported by the controller.
///
/// Types this client does not know about decode as [`ProxyType::Unknown`]
/// so one exotic entry cannot fail a whole `/proxies` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProxyType {
    Direct,
    Reject,
    Selector,
    Shadowsocks,
    Socks5,
    #[serde(rename = "URLTest")]
    UrlTest,
    #[serde(other)]
    Unknown,
}

/// A single proxy or proxy group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,

    /// Member names, in controller order. Empty for plain proxies.
    #[serde(default)]
    pub all: Vec<String>,

    /// Currently selected member. Empty for plain proxies.
    #[serde(default)]
    pub now: String,
}

impl Proxy {
    /// Groups are the proxies whose `now` can change at runtime.
    pub fn is_group(&self) -> bool {
        matches!(self.proxy_type, ProxyType::Selector | ProxyType::UrlTest)
    }
}

/// `GET /proxies` body: name → proxy, in the order the controller sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCollection {
    pub proxies: IndexMap<String, Proxy>,
}

/// `GET /proxy/{name}/delay` body.
///
/// The controller always reports `delay`; some versions echo the proxy
/// fields alongside it, which land in `proxy`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyDelay {
    /// Round-trip latency in milliseconds.
    pub delay: u32,
    #[serde(flatten)]
    pub proxy: Option<Proxy>,
}

// ── Configuration ────────────────────────────────────────────────────

/// Runtime configuration from `GET /configs`, also the `PATCH` body.
///
/// `None` fields are skipped on serialization, so a mostly-empty value
/// is a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(
        default,
        rename = "socket-port",
        alias = "socks-port",
        skip_serializing_if = "Option::is_none"
    )]
    pub socks_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redir_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_lan: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub payload: String,
    /// Proxy or group the matching traffic is routed to.
    pub proxy: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuleList {
    pub rules: Vec<Rule>,
}

// ── Errors ───────────────────────────────────────────────────────────

/// Body of a non-success controller response.
///
/// Newer controllers use `message`, older ones `error`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn log_level_round_trips_through_strings() {
        let names: Vec<String> = LogLevel::iter().map(|l| l.to_string()).collect();
        assert_eq!(names, ["debug", "info", "warning", "error"]);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn unknown_proxy_type_does_not_fail_decode() {
        let proxy: Proxy = serde_json::from_str(r#"{"type":"Vmess"}"#).unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::Unknown);
        assert!(proxy.all.is_empty());
        assert!(!proxy.is_group());
    }

    #[test]
    fn url_test_group_decodes() {
        let proxy: Proxy =
            serde_json::from_str(r#"{"type":"URLTest","all":["a","b"],"now":"b"}"#).unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::UrlTest);
        assert!(proxy.is_group());
        assert_eq!(proxy.now, "b");
    }

    #[test]
    fn partial_config_serializes_only_set_fields() {
        let patch = Config {
            mode: Some("Rule".into()),
            allow_lan: Some(false),
            ..Config::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "mode": "Rule", "allow-lan": false }));
    }

    #[test]
    fn config_accepts_socks_port_alias() {
        let cfg: Config = serde_json::from_str(r#"{"socks-port":7891}"#).unwrap();
        assert_eq!(cfg.socks_port, Some(7891));
    }

    #[test]
    fn delay_without_proxy_fields() {
        let delay: ProxyDelay = serde_json::from_str(r#"{"delay":87}"#).unwrap();
        assert_eq!(delay.delay, 87);
        assert!(delay.proxy.is_none());
    }

    #[test]
    fn error_envelope_accepts_both_keys() {
        let a: ErrorEnvelope = serde_json::from_str(r#"{"message":"Timeout"}"#).unwrap();
        let b: ErrorEnvelope = serde_json::from_str(r#"{"error":"unknown proxy"}"#).unwrap();
        assert_eq!(a.message.as_deref(), Some("Timeout"));
        assert_eq!(b.message.as_deref(), Some("unknown proxy"));
    }

    #[test]
    fn display_formats() {
        let t = Traffic { up: 10, down: 20 };
        assert_eq!(t.to_string(), "\u{2191} 10 \u{2193} 20");
        let l = LogRecord {
            level: LogLevel::Info,
            message: "hello".into(),
        };
        assert_eq!(l.to_string(), "level: info hello");
    }
}
