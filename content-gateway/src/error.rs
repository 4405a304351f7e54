// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the content gateway

use crate::models::{ArticleKind, Role};
use crate::policy::Action;
use thiserror::Error;

/// Gateway error types
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Backend not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Sign-in required")]
    Unauthenticated,

    #[error("Role {role} may not {action} {kind} articles")]
    Forbidden {
        role: Role,
        action: Action,
        kind: ArticleKind,
    },

    #[error("Invalid article: {0}")]
    InvalidArticle(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;
