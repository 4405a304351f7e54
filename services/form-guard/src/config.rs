// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the form guard service.
//!
//! Every value has a default; `Config::from_env` overrides them from the
//! environment (a `.env` file is loaded first by `main`).

use content_gateway::storage::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the form guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Browser origins allowed to post the forms (empty: no CORS headers)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Submission guard configuration
    #[serde(default)]
    pub guard: GuardConfig,

    /// External form endpoints
    #[serde(default)]
    pub forms: FormsConfig,

    /// CV upload limits
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window limits shared by the contact and recruitment forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Submissions allowed per window and category (default: 3)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    /// Trailing window in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// JSON file backing the submission history; in memory when unset
    #[serde(default)]
    pub store_path: Option<String>,

    /// Use the first `X-Forwarded-For` address as the client identity
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Interval of the expired-history sweep in seconds (default: 300)
    #[serde(default = "default_compact_interval_secs")]
    pub compact_interval_secs: u64,
}

/// Where validated submissions are forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// `formResponse` URL of the contact (CTA) form
    #[serde(default)]
    pub cta_url: Option<String>,

    /// `formResponse` URL of the recruitment form
    #[serde(default)]
    pub recruitment_url: Option<String>,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum CV size in bytes (default: 10 MiB)
    #[serde(default = "default_max_cv_bytes")]
    pub max_cv_bytes: u64,

    /// Accepted CV file extensions
    #[serde(default = "default_cv_extensions")]
    pub allowed_cv_extensions: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_submissions() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600 // one hour
}

fn default_compact_interval_secs() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_cv_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_cv_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "doc".to_string(), "docx".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: Vec::new(),
            guard: GuardConfig::default(),
            forms: FormsConfig::default(),
            uploads: UploadConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            window_secs: default_window_secs(),
            store_path: None,
            trust_forwarded_for: false,
            compact_interval_secs: default_compact_interval_secs(),
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            cta_url: None,
            recruitment_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_cv_bytes: default_max_cv_bytes(),
            allowed_cv_extensions: default_cv_extensions(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl GuardConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn compact_interval(&self) -> Duration {
        Duration::from_secs(self.compact_interval_secs.max(1))
    }
}

impl FormsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| env_text(&lookup, key);
        let defaults = Self::default();

        Self {
            bind_addr: text("BIND_ADDR").unwrap_or(defaults.bind_addr),
            allowed_origins: text("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            guard: GuardConfig {
                max_submissions: env_parse(&lookup, "FORM_RATE_CAP").unwrap_or(defaults.guard.max_submissions),
                window_secs: env_parse(&lookup, "FORM_RATE_WINDOW_SECS").unwrap_or(defaults.guard.window_secs),
                store_path: text("FORM_STORE_PATH"),
                trust_forwarded_for: env_parse(&lookup, "TRUST_FORWARDED_FOR")
                    .unwrap_or(defaults.guard.trust_forwarded_for),
                compact_interval_secs: env_parse(&lookup, "FORM_COMPACT_INTERVAL_SECS")
                    .unwrap_or(defaults.guard.compact_interval_secs),
            },
            forms: FormsConfig {
                cta_url: text("FORM_CTA_URL"),
                recruitment_url: text("FORM_RECRUITMENT_URL"),
                timeout_secs: env_parse(&lookup, "FORM_TIMEOUT_SECS").unwrap_or(defaults.forms.timeout_secs),
            },
            uploads: UploadConfig {
                max_cv_bytes: env_parse(&lookup, "MAX_CV_BYTES").unwrap_or(defaults.uploads.max_cv_bytes),
                ..defaults.uploads
            },
            metrics: MetricsConfig {
                enabled: env_parse(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}

fn env_text<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn env_parse<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    env_text(lookup, key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_guard_policy() {
        let config = Config::default();
        assert_eq!(config.guard.max_submissions, 3);
        assert_eq!(config.guard.window_duration(), Duration::from_secs(3600));
        assert_eq!(config.forms.timeout(), Duration::from_secs(10));
        assert_eq!(config.uploads.max_cv_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        let config = Config::from_lookup(|key| match key {
            "FORM_RATE_CAP" => Some("5".to_string()),
            "FORM_RATE_WINDOW_SECS" => Some("not-a-number".to_string()),
            "FORM_CTA_URL" => Some("https://docs.google.com/forms/d/e/abc/formResponse".to_string()),
            "TRUST_FORWARDED_FOR" => Some("true".to_string()),
            "ALLOWED_ORIGINS" => Some("https://agency.example, https://www.agency.example".to_string()),
            _ => None,
        });

        assert_eq!(config.guard.max_submissions, 5);
        assert_eq!(config.guard.window_secs, 3600);
        assert!(config.guard.trust_forwarded_for);
        assert!(config.forms.cta_url.is_some());
        assert!(config.forms.recruitment_url.is_none());
        assert_eq!(config.allowed_origins.len(), 2);
    }
}
