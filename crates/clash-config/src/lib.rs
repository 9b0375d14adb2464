//! Configuration for Clash controller clients.
//!
//! TOML profiles (one per controller), secret resolution (env + keyring +
//! plaintext), and translation to a ready [`clash_api::Client`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clash_api::{Client, TransportConfig};

const KEYRING_SERVICE: &str = "clash-api";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{0}'")]
    UnknownProfile(String),

    #[error("no secret configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build controller client: {0}")]
    Client(#[from] clash_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

/// A single controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// `host:port` or a base URL, e.g. `"127.0.0.1:9090"`.
    pub host: String,

    /// Controller secret (plaintext; prefer keyring or env var).
    pub secret: Option<String>,

    /// Environment variable holding the secret.
    pub secret_env: Option<String>,

    /// Connect timeout in seconds.
    pub connect_timeout: Option<u64>,

    /// Per-read timeout in seconds, streams included.
    pub read_timeout: Option<u64>,

    /// Total timeout in seconds for single-shot requests.
    pub request_timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "clash-api").map_or_else(
        || PathBuf::from(".clash-api.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus `CLASH_` environment
/// overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing files are fine) plus `CLASH_` overrides.
///
/// Nested keys use a double underscore, e.g.
/// `CLASH_PROFILES__HOME__HOST=10.0.0.1:9090`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CLASH_").split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize `cfg` as TOML and write it to `path`, creating parents.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve the controller secret: `secret_env` variable, then the system
/// keyring, then the plaintext `secret` field.
pub fn resolve_secret(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/secret")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref secret) = profile.secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Timeouts from a profile. Unset fields stay unbounded.
pub fn profile_to_transport(profile: &Profile) -> TransportConfig {
    TransportConfig {
        connect_timeout: profile.connect_timeout.map(Duration::from_secs),
        read_timeout: profile.read_timeout.map(Duration::from_secs),
        request_timeout: profile.request_timeout.map(Duration::from_secs),
    }
}

/// Build a `Client` for a profile.
pub fn profile_to_client(profile: &Profile, profile_name: &str) -> Result<Client, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has an empty host"),
        });
    }

    let secret = resolve_secret(profile, profile_name)?;
    let transport = profile_to_transport(profile);
    Ok(Client::new(profile.host.trim(), secret, &transport)?)
}
