//! Provider credentials handed to the trusted front-end.
//!
//! Loaded once at startup and never mutated. The secret values are only
//! reachable through [`Secret::expose`]; `Debug` output is redacted so a
//! stray `?config` in a log line cannot leak them.

use std::fmt;

/// A secret string with a redacted `Debug` representation.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value as-is. Only an empty value is treated as unset.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// The three provider keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub groq: Option<Secret>,
    pub perplexity: Option<Secret>,
    pub gemini: Option<Secret>,
}

/// Which credentials are configured. Safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPresence {
    pub groq: bool,
    pub perplexity: bool,
    pub gemini: bool,
}

impl CredentialSet {
    pub fn from_values(
        groq: Option<String>,
        perplexity: Option<String>,
        gemini: Option<String>,
    ) -> Self {
        Self {
            groq: groq.and_then(Secret::new),
            perplexity: perplexity.and_then(Secret::new),
            gemini: gemini.and_then(Secret::new),
        }
    }

    pub fn presence(&self) -> CredentialPresence {
        CredentialPresence {
            groq: self.groq.is_some(),
            perplexity: self.perplexity.is_some(),
            gemini: self.gemini.is_some(),
        }
    }
}
