//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! server. All types derive Serde traits for deserialization from config files;
//! every section has defaults so an empty file (or no file) is a valid config.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialSet;

/// Root configuration for the edge server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Deployment mode. Affects CSP, error verbosity and origin strictness.
    pub mode: Mode,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Upstream proxy trust.
    pub proxy: ProxyConfig,

    /// Static asset bundle location.
    pub static_files: StaticConfig,

    /// Rate limiting tiers.
    pub rate_limit: RateLimitConfig,

    /// Origins allowed to fetch `/api/keys` in production.
    pub origins: OriginConfig,

    /// Body limits and compression.
    pub security: SecurityConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Provider credentials. Only ever sourced from the environment.
    #[serde(skip)]
    pub credentials: CredentialSet,
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Parse the conventional environment strings. Anything that is not a
    /// production spelling is treated as development.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Mode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Upstream proxy trust configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Derive client identity from the left-most `X-Forwarded-For` entry.
    /// Only enable behind a reverse proxy that overwrites the header.
    pub trust_proxy: bool,
}

/// Static asset bundle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Directory holding the built front-end.
    pub root: PathBuf,

    /// Entry document served for every unmatched path.
    pub index: String,
}

impl StaticConfig {
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            index: "index.html".to_string(),
        }
    }
}

/// Named rate-limit presets. Both are valid deployments of the same server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitPreset {
    /// 100 requests / 15 min globally, 10 requests / min on `/api/`.
    #[default]
    Standard,
    /// 200 requests / 15 min globally, 20 requests / min on `/api/`.
    Relaxed,
}

impl RateLimitPreset {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "relaxed" => Some(Self::Relaxed),
            _ => None,
        }
    }

    pub fn global(self) -> TierConfig {
        let max_requests = match self {
            Self::Standard => 100,
            Self::Relaxed => 200,
        };
        TierConfig {
            window_secs: 15 * 60,
            max_requests,
        }
    }

    pub fn api(self) -> TierConfig {
        let max_requests = match self {
            Self::Standard => 10,
            Self::Relaxed => 20,
        };
        TierConfig {
            window_secs: 60,
            max_requests,
        }
    }
}

/// A single fixed-window tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests allowed per client within one window.
    pub max_requests: u32,
}

impl TierConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Preset supplying the tier defaults.
    pub preset: RateLimitPreset,

    /// Override for the global tier.
    pub global: Option<TierConfig>,

    /// Override for the `/api/` tier.
    pub api: Option<TierConfig>,

    /// How often expired windows are purged, in seconds.
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    pub fn global_tier(&self) -> TierConfig {
        self.global.unwrap_or_else(|| self.preset.global())
    }

    pub fn api_tier(&self) -> TierConfig {
        self.api.unwrap_or_else(|| self.preset.api())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            preset: RateLimitPreset::default(),
            global: None,
            api: None,
            sweep_interval_secs: 60,
        }
    }
}

/// Origins permitted to receive credentials in production.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Deployed front-end origin (e.g. `https://app.example.com`).
    pub frontend: Option<String>,

    /// Hosting platform origin, when the front-end is also reachable there.
    pub platform: Option<String>,

    /// Ports accepted for `localhost` / `127.0.0.1`.
    pub localhost_ports: Vec<u16>,

    /// Any further origins.
    pub extra: Vec<String>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            frontend: None,
            platform: None,
            localhost_ports: vec![3000, 5173, 8080],
            extra: Vec::new(),
        }
    }
}

/// Body limits and response compression.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Responses smaller than this are sent uncompressed.
    pub compression_threshold: u16,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            compression_threshold: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Force JSON logs on or off. Defaults to JSON in production.
    pub json_logs: Option<bool>,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
