// SPDX-License-Identifier: PMPL-1.0-or-later
//! Content queries and admin mutations for articles, services and categories.

use crate::client::{BackendClient, Query};
use crate::error::{GatewayError, Result};
use crate::listing::slugify;
use crate::models::{
    Article, ArticleKind, ArticlePatch, ArticleStatus, Category, NewArticle, Profile, Service,
};
use crate::policy::{Action, Policy};
use crate::storage::ObjectStorage;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

const ARTICLES: &str = "articles";
const SERVICES: &str = "services";
const CATEGORIES: &str = "categories";
const PROFILES: &str = "profiles";

/// Filter for article listings
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub kind: ArticleKind,
    pub category_id: Option<Uuid>,
    /// Case-insensitive title search
    pub search: Option<String>,
    /// Include drafts (admin console only)
    pub include_drafts: bool,
    pub offset: usize,
    pub limit: usize,
}

impl ArticleFilter {
    pub fn published(kind: ArticleKind) -> Self {
        Self {
            kind,
            category_id: None,
            search: None,
            include_drafts: false,
            offset: 0,
            limit: 100,
        }
    }
}

/// Thin query layer over the hosted backend
pub struct ContentGateway {
    client: BackendClient,
    policy: Policy,
}

impl ContentGateway {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            policy: Policy::default(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// List articles, newest first
    pub async fn list_articles(&self, filter: &ArticleFilter, actor: Option<&Profile>) -> Result<Vec<Article>> {
        let mut query = Query::table(ARTICLES).eq("kind", filter.kind);

        if filter.include_drafts {
            self.policy.authorize(actor, Action::ReadDrafts, filter.kind)?;
        } else {
            query = query.eq("status", ArticleStatus::Published.as_str());
        }
        if let Some(category) = filter.category_id {
            query = query.eq("category_id", category);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.ilike("title", search.trim());
        }

        let query = query
            .order("created_at", false)
            .range(filter.offset, filter.limit.max(1));
        self.client.select(&query).await
    }

    /// Get a published article by slug (drafts are visible to editors)
    pub async fn get_article_by_slug(
        &self,
        kind: ArticleKind,
        slug: &str,
        actor: Option<&Profile>,
    ) -> Result<Article> {
        let query = Query::table(ARTICLES).eq("kind", kind).eq("slug", slug);
        let article: Article = self
            .client
            .select_one(&query)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("{kind}/{slug}")))?;

        if !article.is_published() && self.policy.authorize(actor, Action::ReadDrafts, kind).is_err() {
            return Err(GatewayError::NotFound(format!("{kind}/{slug}")));
        }
        Ok(article)
    }

    /// Get article by ID
    pub async fn get_article(&self, id: Uuid) -> Result<Article> {
        self.client
            .select_one(&Query::table(ARTICLES).eq("id", id))
            .await?
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    /// Create a new article
    pub async fn create_article(&self, actor: &Profile, mut article: NewArticle) -> Result<Article> {
        self.policy.authorize(Some(actor), Action::Create, article.kind)?;

        if article.title.trim().is_empty() {
            return Err(GatewayError::InvalidArticle("title is required".to_string()));
        }
        if article.slug.trim().is_empty() {
            article.slug = slugify(&article.title);
        }
        if article.slug.is_empty() {
            return Err(GatewayError::InvalidArticle(
                "title does not produce a usable slug".to_string(),
            ));
        }
        article.author_id = Some(actor.id);
        if article.status == ArticleStatus::Published && article.published_at.is_none() {
            article.published_at = Some(Utc::now());
        }

        let created: Article = self.client.insert(ARTICLES, &article).await?;
        info!(id = %created.id, kind = %created.kind, user = %actor.id, "Article created");
        Ok(created)
    }

    /// Update an article
    pub async fn update_article(&self, actor: &Profile, id: Uuid, mut patch: ArticlePatch) -> Result<Article> {
        let existing = self.get_article(id).await?;
        self.policy.authorize(Some(actor), Action::Update, existing.kind)?;

        if let Some(slug) = &patch.slug {
            if slug.trim().is_empty() {
                patch.slug = None;
            }
        }
        if patch.status == Some(ArticleStatus::Published) && existing.published_at.is_none() {
            patch.published_at = Some(Utc::now());
        }
        patch.updated_at = Some(Utc::now());

        let updated: Article = self.client.update(ARTICLES, id, &patch).await?;
        info!(%id, kind = %updated.kind, user = %actor.id, "Article updated");
        Ok(updated)
    }

    /// Delete an article and, best-effort, its cover image
    pub async fn delete_article(&self, actor: &Profile, id: Uuid, storage: Option<&ObjectStorage>) -> Result<()> {
        let existing = self.get_article(id).await?;
        self.policy.authorize(Some(actor), Action::Delete, existing.kind)?;

        self.client.delete(ARTICLES, id).await?;
        info!(%id, kind = %existing.kind, user = %actor.id, "Article deleted");

        if let (Some(storage), Some(cover)) = (storage, existing.cover_image.as_deref()) {
            if let Err(e) = storage.delete(cover).await {
                warn!(%id, error = %e, "Cover image left in storage");
            }
        }
        Ok(())
    }

    /// Services in display order
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        self.client
            .select(&Query::table(SERVICES).order("sort_order", true))
            .await
    }

    pub async fn list_categories(&self, kind: ArticleKind) -> Result<Vec<Category>> {
        self.client
            .select(&Query::table(CATEGORIES).eq("kind", kind).order("name", true))
            .await
    }

    /// Admin profile for a signed-in user
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile> {
        self.client
            .select_one(&Query::table(PROFILES).eq("id", user_id))
            .await?
            .ok_or(GatewayError::Unauthenticated)
    }
}
