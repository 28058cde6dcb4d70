//! Relay configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, configuration files, or `RELAY_*` environment
//! variables. [`RelaySettings`] mirrors the raw inputs; [`RelaySettings::resolve`]
//! applies defaults and validation and yields a [`RelayConfig`] the server can
//! use directly.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5_000;
const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SEND_QUEUE_CAPACITY: usize = 64;

/// Startup configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A CLI, file, or environment source could not be parsed.
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    /// No signing secret was configured.
    #[error("RELAY_JWT_SECRET must be set")]
    MissingSecret,
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address `{value}`: {reason}")]
    InvalidBindAddr { value: String, reason: String },
    /// An allow-list entry is not an http(s) origin.
    #[error("invalid allowed origin `{value}`: {reason}")]
    InvalidOrigin { value: String, reason: String },
    /// `send_queue_capacity` is zero.
    #[error("send queue capacity must be positive")]
    ZeroCapacity,
    /// `heartbeat_interval_ms` is zero.
    #[error("heartbeat interval must be positive")]
    ZeroHeartbeat,
    /// The idle timeout would fire before the next ping.
    #[error("client timeout ({timeout_ms}ms) must exceed the heartbeat interval ({heartbeat_ms}ms)")]
    TimeoutTooShort { timeout_ms: u64, heartbeat_ms: u64 },
}

/// Raw relay settings.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RELAY")]
pub struct RelaySettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Shared secret for HS256 bearer tokens.
    pub jwt_secret: Option<String>,
    /// Comma-separated Origin allow-list; unset or empty accepts any origin.
    pub allowed_origins: Option<String>,
    /// Milliseconds between server pings.
    pub heartbeat_interval_ms: Option<u64>,
    /// Milliseconds of client silence before the connection is closed.
    pub client_timeout_ms: Option<u64>,
    /// Frames buffered per connection before deliveries are dropped.
    pub send_queue_capacity: Option<usize>,
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("allowed_origins", &self.allowed_origins)
            .field("heartbeat_interval_ms", &self.heartbeat_interval_ms)
            .field("client_timeout_ms", &self.client_timeout_ms)
            .field("send_queue_capacity", &self.send_queue_capacity)
            .finish()
    }
}

impl RelaySettings {
    /// Load settings from the process arguments and environment.
    ///
    /// # Errors
    /// Returns [`SettingsError::Load`] when a source cannot be parsed.
    pub fn load_from_process() -> Result<Self, SettingsError> {
        Self::load_from_iter(std::env::args_os()).map_err(|error| SettingsError::Load {
            message: error.to_string(),
        })
    }

    /// Apply defaults and validate.
    ///
    /// # Errors
    /// Returns the first [`SettingsError`] found.
    pub fn resolve(self) -> Result<RelayConfig, SettingsError> {
        let bind_value = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_value
            .parse::<SocketAddr>()
            .map_err(|error| SettingsError::InvalidBindAddr {
                value: bind_value.clone(),
                reason: error.to_string(),
            })?;

        let jwt_secret = self
            .jwt_secret
            .filter(|secret| !secret.trim().is_empty())
            .map(Zeroizing::new)
            .ok_or(SettingsError::MissingSecret)?;

        let allowed_origins = parse_origins(self.allowed_origins.as_deref().unwrap_or_default())?;

        let heartbeat_ms = self
            .heartbeat_interval_ms
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_MS);
        if heartbeat_ms == 0 {
            return Err(SettingsError::ZeroHeartbeat);
        }
        let timeout_ms = self.client_timeout_ms.unwrap_or(DEFAULT_CLIENT_TIMEOUT_MS);
        if timeout_ms <= heartbeat_ms {
            return Err(SettingsError::TimeoutTooShort {
                timeout_ms,
                heartbeat_ms,
            });
        }

        let send_queue_capacity = self
            .send_queue_capacity
            .unwrap_or(DEFAULT_SEND_QUEUE_CAPACITY);
        if send_queue_capacity == 0 {
            return Err(SettingsError::ZeroCapacity);
        }

        Ok(RelayConfig {
            bind_addr,
            jwt_secret,
            allowed_origins,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
            client_timeout: Duration::from_millis(timeout_ms),
            send_queue_capacity,
        })
    }
}

/// Normalise each entry to its ASCII origin (`scheme://host[:port]`).
fn parse_origins(raw: &str) -> Result<Vec<String>, SettingsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let url = Url::parse(entry).map_err(|error| SettingsError::InvalidOrigin {
                value: entry.to_owned(),
                reason: error.to_string(),
            })?;
            let origin = url.origin();
            if !origin.is_tuple() {
                return Err(SettingsError::InvalidOrigin {
                    value: entry.to_owned(),
                    reason: "origin must have a scheme and host".to_owned(),
                });
            }
            Ok(origin.ascii_serialization())
        })
        .collect()
}

/// Validated configuration.
#[derive(Clone)]
pub struct RelayConfig {
    /// Listener address.
    pub bind_addr: SocketAddr,
    /// HS256 secret, zeroed on drop.
    pub jwt_secret: Zeroizing<String>,
    /// Normalised origins; empty accepts any origin.
    pub allowed_origins: Vec<String>,
    /// Time between server pings.
    pub heartbeat_interval: Duration,
    /// Silence after which a connection is closed.
    pub client_timeout: Duration,
    /// Outbound frames buffered per connection.
    pub send_queue_capacity: usize,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("allowed_origins", &self.allowed_origins)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("client_timeout", &self.client_timeout)
            .field("send_queue_capacity", &self.send_queue_capacity)
            .finish()
    }
}
