#![doc = "Remote content source for the CLI: implements the core `ContentSource` seam against the Notion HTTP API."]
//
//! # Notion client (CLI <-> Core)
//!
//! [`NotionClient`] is the only place that knows about URLs, headers and status codes.
//! The core crate sees it through [`post_sync_core::contract::ContentSource`] and gets
//! back one [`ListPage`] per call; draining cursors is the core's job.
//!
//! - `query_pages`: `POST {base}/databases/{id}/query` with a status filter
//! - `list_children`: `GET {base}/blocks/{id}/children`
//!
//! Non-success responses become errors carrying the status and response body.

use async_trait::async_trait;
use post_sync_core::contract::{ContentSource, PublishedFilter};
use post_sync_core::error::FetchError;
use post_sync_core::model::{BlockRecord, ListPage, PageRecord};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::load_config::Settings;

pub const NOTION_VERSION: &str = "2022-06-28";
pub const PAGE_SIZE: u32 = 100;

pub struct NotionClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        NotionClient {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
            database_id: database_id.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        tracing::info!(
            api_url = %settings.api_url,
            database_id = %settings.database_id,
            token_set = !settings.token.is_empty(),
            "Initialized NotionClient from configuration"
        );
        Self::new(
            settings.api_url.clone(),
            settings.token.clone(),
            settings.database_id.clone(),
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ListPage<T>, FetchError> {
        let response = request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Request to content API failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Content API returned an error status");
            return Err(format!("content API returned {status}: {body}").into());
        }

        let page = response.json::<ListPage<T>>().await.map_err(|e| {
            tracing::error!(error = ?e, "Failed to decode content API response");
            e
        })?;
        Ok(page)
    }
}

/// Body of a database query for one page of published pages.
pub fn query_body(filter: &PublishedFilter, cursor: Option<&str>) -> Value {
    let mut condition = serde_json::Map::new();
    condition.insert("property".to_string(), json!(filter.property));
    condition.insert(
        filter.kind.as_str().to_string(),
        json!({ "equals": filter.value }),
    );

    let mut body = json!({
        "filter": Value::Object(condition),
        "page_size": PAGE_SIZE,
    });
    if let Some(cursor) = cursor {
        body["start_cursor"] = json!(cursor);
    }
    body
}

/// Query-string pairs for one page of block children.
pub fn children_query(cursor: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page_size", PAGE_SIZE.to_string())];
    if let Some(cursor) = cursor {
        query.push(("start_cursor", cursor.to_string()));
    }
    query
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn query_pages(
        &self,
        filter: &PublishedFilter,
        cursor: Option<String>,
    ) -> Result<ListPage<PageRecord>, FetchError> {
        tracing::debug!(
            database_id = %self.database_id,
            cursor = ?cursor,
            "Querying published pages"
        );
        let url = format!("{}/databases/{}/query", self.api_url, self.database_id);
        let request = self
            .http
            .post(url)
            .json(&query_body(filter, cursor.as_deref()));
        self.send(request).await
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<ListPage<BlockRecord>, FetchError> {
        tracing::debug!(block_id, cursor = ?cursor, "Listing block children");
        let url = format!("{}/blocks/{}/children", self.api_url, block_id);
        let request = self
            .http
            .get(url)
            .query(&children_query(cursor.as_deref()));
        self.send(request).await
    }
}
