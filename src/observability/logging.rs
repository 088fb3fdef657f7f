//! Structured logging.
//!
//! JSON lines in production, human-readable output in development. The
//! filter comes from `RUST_LOG` when set, else from the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Mode, ObservabilityConfig};

/// Filter directive for a configured level. A bare level is scoped to this
/// crate and tower_http; anything else is used verbatim.
pub fn default_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        lvl @ ("trace" | "debug" | "info" | "warn" | "error") => {
            format!("spa_edge={lvl},tower_http={lvl}")
        }
        _ => level.to_string(),
    }
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(mode: Mode, config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let json = config.json_logs.unwrap_or(mode.is_production());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("info"), "spa_edge=info,tower_http=info");
        assert_eq!(default_directive("DEBUG"), "spa_edge=debug,tower_http=debug");
        assert_eq!(default_directive("hyper=warn,spa_edge=trace"), "hyper=warn,spa_edge=trace");
    }
}
