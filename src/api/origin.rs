//! Origin allow-listing for credential distribution.
//!
//! Origins are compared in normalized form: lowercase scheme and host, default
//! ports elided, no path or trailing slash. `https://App.example.com/` and
//! `https://app.example.com` are the same origin.

use std::collections::HashSet;

use url::Url;

use crate::config::{Mode, OriginConfig};

/// Normalize an origin string, returning `None` if it is not an http(s) origin.
pub fn normalize_origin(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}

/// Decides which `Origin` headers may receive credentials.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    enforce: bool,
    allowed: HashSet<String>,
}

impl OriginPolicy {
    /// Build the allow-list. Entries that fail to normalize are skipped;
    /// configuration validation reports them before we get here.
    pub fn new(mode: Mode, config: &OriginConfig) -> Self {
        let mut allowed = HashSet::new();

        for port in &config.localhost_ports {
            for host in ["localhost", "127.0.0.1"] {
                allowed.insert(format!("http://{}:{}", host, port));
            }
        }

        for origin in config
            .frontend
            .iter()
            .chain(config.platform.iter())
            .chain(config.extra.iter())
        {
            if let Some(normalized) = normalize_origin(origin) {
                allowed.insert(normalized);
            }
        }

        Self {
            enforce: mode.is_production(),
            allowed,
        }
    }

    /// Whether the allow-list is enforced at all (production only).
    pub fn enforced(&self) -> bool {
        self.enforce
    }

    /// Check an `Origin` header value.
    pub fn permits(&self, origin: Option<&str>) -> bool {
        if !self.enforce {
            return true;
        }
        origin
            .and_then(normalize_origin)
            .map(|o| self.allowed.contains(&o))
            .unwrap_or(false)
    }

    pub fn allowed_count(&self) -> usize {
        self.allowed.len()
    }
}
