// SPDX-License-Identifier: PMPL-1.0-or-later
//! Hosted backend configuration.
//!
//! The endpoint URL and the public (anon) API key are supplied through the
//! environment. A missing value is logged and leaves the gateway
//! unconfigured; every call then fails with
//! [`GatewayError::NotConfigured`](crate::GatewayError::NotConfigured).

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const ENV_BACKEND_URL: &str = "BACKEND_URL";
pub const ENV_BACKEND_ANON_KEY: &str = "BACKEND_ANON_KEY";
pub const ENV_STORAGE_BUCKET: &str = "STORAGE_BUCKET";
pub const ENV_BACKEND_TIMEOUT_SECS: &str = "BACKEND_TIMEOUT_SECS";

/// Connection settings for the hosted database and object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.example.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Public API key sent as `apikey` on every request
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Object storage bucket (default: media)
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bucket() -> String {
    "media".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: default_bucket(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = non_empty(ENV_BACKEND_URL).map(|u| u.trim_end_matches('/').to_string());
        if url.is_none() {
            warn!(var = ENV_BACKEND_URL, "Backend URL not set, content gateway disabled");
        }

        let anon_key = non_empty(ENV_BACKEND_ANON_KEY);
        if anon_key.is_none() {
            warn!(var = ENV_BACKEND_ANON_KEY, "Backend API key not set, content gateway disabled");
        }

        Self {
            url,
            anon_key,
            bucket: non_empty(ENV_STORAGE_BUCKET).unwrap_or_else(default_bucket),
            timeout_secs: non_empty(ENV_BACKEND_TIMEOUT_SECS)
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }

    /// Base URL and API key, or the name of whichever is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let url = self
            .url
            .as_deref()
            .ok_or(GatewayError::NotConfigured(ENV_BACKEND_URL))?;
        let key = self
            .anon_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured(ENV_BACKEND_ANON_KEY))?;
        Ok((url, key))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_vars_leave_gateway_unconfigured() {
        let config = BackendConfig::from_lookup(lookup(&[]));
        assert!(!config.is_configured());
        assert!(matches!(
            config.credentials(),
            Err(GatewayError::NotConfigured(ENV_BACKEND_URL))
        ));
        assert_eq!(config.bucket, "media");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = BackendConfig::from_lookup(lookup(&[
            (ENV_BACKEND_URL, "https://db.example.co/"),
            (ENV_BACKEND_ANON_KEY, "anon"),
            (ENV_STORAGE_BUCKET, "assets"),
        ]));
        assert_eq!(config.credentials().unwrap(), ("https://db.example.co", "anon"));
        assert_eq!(config.bucket, "assets");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = BackendConfig::from_lookup(lookup(&[
            (ENV_BACKEND_URL, "https://db.example.co"),
            (ENV_BACKEND_ANON_KEY, "   "),
        ]));
        assert!(matches!(
            config.credentials(),
            Err(GatewayError::NotConfigured(ENV_BACKEND_ANON_KEY))
        ));
    }
}
