//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! Validation is a pure function and reports every problem, not just the first.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::api::origin::normalize_origin;
use crate::config::schema::{EdgeConfig, TierConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener address '{0}' is not a valid socket address")]
    BindAddress(String),

    #[error("rate limit tier '{tier}' must have a non-zero window")]
    ZeroWindow { tier: &'static str },

    #[error("rate limit tier '{tier}' must allow at least one request")]
    ZeroCap { tier: &'static str },

    #[error("rate limit sweep interval must be non-zero")]
    ZeroSweepInterval,

    #[error("max_body_bytes must be non-zero")]
    ZeroBodyLimit,

    #[error("origin '{0}' is not a valid http(s) origin")]
    Origin(String),

    #[error("metrics address '{0}' is not a valid socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = config.listener.host.trim_start_matches('[').trim_end_matches(']');
    if host != "localhost" && host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address()));
    }

    check_tier("global", &config.rate_limit.global_tier(), &mut errors);
    check_tier("api", &config.rate_limit.api_tier(), &mut errors);

    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let origins = &config.origins;
    for origin in origins
        .frontend
        .iter()
        .chain(origins.platform.iter())
        .chain(origins.extra.iter())
    {
        if normalize_origin(origin).is_none() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_tier(tier: &'static str, config: &TierConfig, errors: &mut Vec<ValidationError>) {
    if config.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow { tier });
    }
    if config.max_requests == 0 {
        errors.push(ValidationError::ZeroCap { tier });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EdgeConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.listener.host = "not a host".into();
        config.rate_limit.api = Some(TierConfig { window_secs: 0, max_requests: 0 });
        config.security.max_body_bytes = 0;
        config.origins.frontend = Some("app.example.com".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroWindow { tier: "api" }));
        assert!(errors.contains(&ValidationError::ZeroCap { tier: "api" }));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::Origin("app.example.com".into())));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = EdgeConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nowhere".into())]
        );
    }
}
