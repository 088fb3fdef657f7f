//! Configuration loading from disk and the process environment.
//!
//! Layering: built-in defaults, then an optional TOML file, then environment
//! overrides. The result is validated before it is handed to the server.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{EdgeConfig, Mode, RateLimitPreset};
use crate::config::validation::{validate_config, ValidationError};
use crate::credentials::CredentialSet;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the full configuration from an optional file and the process
/// environment, then validate it.
pub fn load_config(path: Option<&Path>) -> Result<EdgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => EdgeConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to resolve variables.
pub fn apply_env<F>(config: &mut EdgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(mode) = get("EDGE_ENV").or_else(|| get("NODE_ENV")) {
        config.mode = Mode::from_env_value(&mode);
    }

    if let Some(host) = get("HOST") {
        config.listener.host = host;
    }

    if let Some(port) = get("PORT") {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            reason: format!("'{}' is not a valid port", port),
        })?;
    }

    if let Some(trust) = get("TRUST_PROXY") {
        config.proxy.trust_proxy = parse_flag("TRUST_PROXY", &trust)?;
    }

    if let Some(dir) = get("STATIC_DIR") {
        config.static_files.root = dir.into();
    }

    if let Some(preset) = get("RATE_LIMIT_PRESET") {
        config.rate_limit.preset =
            RateLimitPreset::parse(&preset).ok_or_else(|| ConfigError::Env {
                var: "RATE_LIMIT_PRESET",
                reason: format!("expected 'standard' or 'relaxed', got '{}'", preset),
            })?;
    }

    if let Some(origin) = get("FRONTEND_URL") {
        config.origins.frontend = Some(origin);
    }

    if let Some(origin) = get("PLATFORM_URL") {
        config.origins.platform = Some(origin);
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }

    config.credentials = CredentialSet::from_values(
        lookup("GROQ_API_KEY"),
        lookup("PERPLEXITY_API_KEY"),
        lookup("GEMINI_API_KEY"),
    );

    Ok(())
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            var,
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EdgeConfig::default();
        apply_env(
            &mut config,
            env(&[
                ("NODE_ENV", "production"),
                ("PORT", "8080"),
                ("TRUST_PROXY", "true"),
                ("FRONTEND_URL", "https://app.example.com"),
                ("GROQ_API_KEY", "gsk_abc"),
                ("GEMINI_API_KEY", ""),
            ]),
        )
        .unwrap();

        assert!(config.mode.is_production());
        assert_eq!(config.listener.port, 8080);
        assert!(config.proxy.trust_proxy);
        assert_eq!(config.origins.frontend.as_deref(), Some("https://app.example.com"));
        let presence = config.credentials.presence();
        assert!(presence.groq);
        assert!(!presence.perplexity);
        assert!(!presence.gemini);
    }

    #[test]
    fn test_edge_env_takes_precedence() {
        let mut config = EdgeConfig::default();
        apply_env(
            &mut config,
            env(&[("EDGE_ENV", "development"), ("NODE_ENV", "production")]),
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = EdgeConfig::default();
        let err = apply_env(&mut config, env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn test_bad_flag_is_rejected() {
        let mut config = EdgeConfig::default();
        let err = apply_env(&mut config, env(&[("TRUST_PROXY", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("TRUST_PROXY"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[static_files]\nroot = \"public\"\n\n[rate_limit]\npreset = \"relaxed\"").unwrap();

        let config = load_file(file.path()).unwrap();
        assert_eq!(config.static_files.root, std::path::PathBuf::from("public"));
        assert_eq!(config.rate_limit.preset, RateLimitPreset::Relaxed);
    }

    #[test]
    fn test_load_file_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener\nport = 1").unwrap();
        assert!(matches!(load_file(file.path()), Err(ConfigError::Parse(_))));
    }
}
