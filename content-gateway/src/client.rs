// SPDX-License-Identifier: PMPL-1.0-or-later
//! REST client for the hosted relational store.
//!
//! Tables are exposed under `{url}/rest/v1/{table}` and filtered with
//! query-string operators (`col=eq.value`, `order=col.desc`, `limit`,
//! `offset`). Every request carries the public `apikey`; mutations also carry
//! the signed-in user's access token so row-level security applies.

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use tracing::debug;

/// Query builder for a single table select.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            params: vec![("select".to_string(), "*".to_string())],
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params[0].1 = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match
    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        let needle: String = needle.chars().filter(|c| !matches!(c, '*' | ',' | '(' | ')')).collect();
        self.params.push((column.to_string(), format!("ilike.*{needle}*")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.params.push(("order".to_string(), format!("{column}.{dir}")));
        self
    }

    /// Set `offset` and `limit`, replacing any earlier range.
    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.params.retain(|(key, _)| key != "offset" && key != "limit");
        self.params.push(("offset".to_string(), offset.to_string()));
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Connection wrapper around the hosted backend
#[derive(Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            config,
            http,
            access_token: None,
        })
    }

    /// Copy of this client acting on behalf of a signed-in user.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Base URL after checking the gateway is configured.
    pub(crate) fn base_url(&self) -> Result<&str> {
        self.config.credentials().map(|(url, _)| url)
    }

    /// Attach the API key and bearer token.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let (_, key) = self.config.credentials()?;
        let bearer = self.access_token.as_deref().unwrap_or(key);
        Ok(request.header("apikey", key).bearer_auth(bearer))
    }

    fn rest_url(&self, table: &str) -> Result<String> {
        Ok(format!("{}/rest/v1/{}", self.base_url()?, table))
    }

    /// Turn a non-2xx response into `GatewayError::Backend`.
    pub(crate) async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Backend {
            status: status.as_u16(),
            body,
        })
    }

    /// Run a select query
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let url = self.rest_url(query.table_name())?;
        debug!(table = query.table_name(), params = ?query.params(), "Select");

        let request = self.authorize(self.http.get(&url).query(query.params()))?;
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// First row of a select, if any
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> Result<Option<T>> {
        let rows: Vec<T> = self.select(&query.clone().range(0, 1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a row and return the stored representation
    pub async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, row: &B) -> Result<T> {
        let url = self.rest_url(table)?;
        debug!(table, "Insert");

        let request = self.authorize(
            self.http
                .post(&url)
                .header("Prefer", "return=representation")
                .json(row),
        )?;
        let response = Self::check(request.send().await?).await?;
        let rows: Vec<T> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("{table}: insert returned no row")))
    }

    /// Patch the row with the given id
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        id: impl Display,
        patch: &B,
    ) -> Result<T> {
        let url = self.rest_url(table)?;
        debug!(table, %id, "Update");

        let request = self.authorize(
            self.http
                .patch(&url)
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=representation")
                .json(patch),
        )?;
        let response = Self::check(request.send().await?).await?;
        let rows: Vec<T> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("{table}/{id}")))
    }

    /// Delete the row with the given id
    pub async fn delete(&self, table: &str, id: impl Display) -> Result<()> {
        let url = self.rest_url(table)?;
        debug!(table, %id, "Delete");

        let request = self.authorize(self.http.delete(&url).query(&[("id", format!("eq.{id}"))]))?;
        Self::check(request.send().await?).await?;
        Ok(())
    }
}
