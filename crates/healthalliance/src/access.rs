//! API-key gate guarding every non-probe endpoint.
//!
//! The allowlist is built once from configuration and shared read-only; a
//! changed `API_KEYS` value only takes effect after a restart.

use std::collections::HashSet;
use std::sync::Arc;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Immutable set of accepted API keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAllowlist {
    keys: Arc<HashSet<String>>,
}

impl ApiKeyAllowlist {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Parse a comma-separated list, dropping blank entries.
    pub fn from_comma_separated(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty()),
        )
    }

    /// Exact membership test; the presented value is never trimmed or folded.
    pub fn contains(&self, credential: &str) -> bool {
        self.keys.contains(credential)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn authorize(&self, credential: Option<&str>) -> Result<(), AccessDenied> {
        match credential {
            Some(key) if self.contains(key) => Ok(()),
            Some(_) => Err(AccessDenied::UnknownKey),
            None => Err(AccessDenied::MissingKey),
        }
    }
}

/// Why a request was turned away by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("missing API key")]
    MissingKey,
    #[error("API key not recognised")]
    UnknownKey,
}
