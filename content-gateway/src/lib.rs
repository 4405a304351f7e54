// SPDX-License-Identifier: PMPL-1.0-or-later
//! Content gateway for the agency site.
//!
//! Thin wrappers over the hosted backend:
//!
//! - REST queries for articles (news and projects), services and categories
//! - Role-gated mutations for the admin console
//! - Object storage uploads for CVs and article images
//! - Listing helpers (pagination, category filter, slugs)

pub mod articles;
pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod policy;
pub mod storage;

pub use articles::{ArticleFilter, ContentGateway};
pub use client::{BackendClient, Query};
pub use config::BackendConfig;
pub use error::{GatewayError, Result};
pub use policy::{Action, Policy};
pub use storage::{validate_file_size, ObjectStorage, StorageError, StorageFolder, UploadFile};
