// SPDX-License-Identifier: PMPL-1.0-or-later
//! Data models for site content and admin profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Article kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleKind {
    /// News / magazine post
    News,
    /// Portfolio project
    Project,
}

impl ArticleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// News or project article as stored in the `articles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub kind: ArticleKind,
    pub title: String,
    /// URL slug, unique per kind
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Rich-text HTML produced by the admin editor
    #[serde(default)]
    pub content: String,
    /// Public object storage URL
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// Insert payload for a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub kind: ArticleKind,
    pub title: String,
    /// Derived from the title when empty
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub status: ArticleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewArticle {
    pub fn new(kind: ArticleKind, title: impl Into<String>, status: ArticleStatus) -> Self {
        Self {
            kind,
            title: title.into(),
            slug: String::new(),
            excerpt: None,
            content: String::new(),
            cover_image: None,
            category_id: None,
            status,
            author_id: None,
            published_at: None,
        }
    }
}

/// Partial update; only `Some` fields are sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Service offered by the agency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Article category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub kind: ArticleKind,
}

/// Admin console role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    NewsEditor,
    ProjectEditor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::NewsEditor => write!(f, "news_editor"),
            Self::ProjectEditor => write!(f, "project_editor"),
        }
    }
}

/// Signed-in admin user, from the `profiles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_decodes_backend_row() {
        let row = serde_json::json!({
            "id": "5f0c6a1e-2d7b-4f7e-9a51-1d8e4c2b9a10",
            "kind": "project",
            "title": "Brand refresh",
            "slug": "brand-refresh",
            "content": "<p>Done</p>",
            "status": "published",
            "created_at": "2026-03-01T09:00:00Z",
            "updated_at": "2026-03-02T09:00:00Z",
            "published_at": "2026-03-02T09:00:00Z"
        });

        let article: Article = serde_json::from_value(row).unwrap();
        assert_eq!(article.kind, ArticleKind::Project);
        assert!(article.is_published());
        assert!(article.cover_image.is_none());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ArticlePatch {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "title": "New title" }));
    }

    #[test]
    fn test_role_wire_names() {
        let role: Role = serde_json::from_str("\"news_editor\"").unwrap();
        assert_eq!(role, Role::NewsEditor);
        assert_eq!(role.to_string(), "news_editor");
    }
}
