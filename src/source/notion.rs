//! Notion-compatible HTTP document source.
//!
//! Talks to `{base_url}/v1/...` directly, or to a reverse proxy that adds
//! the authorization header itself (in which case no token is configured).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{DocumentSource, RecordQuery};
use crate::error::{Error, Result};
use crate::model::Record;

/// Default API location.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Default `Notion-Version` header.
pub const DEFAULT_VERSION: &str = "2022-06-28";

const PAGE_SIZE: u32 = 100;

/// Connection settings for [`NotionSource`].
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

/// Database query request body.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Value>,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    sorts: &'a [Value],
}

/// One page of database query results.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Record>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// Document source backed by the Notion REST API.
pub struct NotionSource {
    client: reqwest::Client,
    config: NotionConfig,
}

impl NotionSource {
    #[must_use]
    pub fn new(config: NotionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Notion-Version", &self.config.version);
        match &self.config.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(Error::Source(format!("{status}: {excerpt}")));
        }

        Ok(response.json().await?)
    }
}

impl DocumentSource for NotionSource {
    async fn query_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let url = self.url(&format!("databases/{}/query", query.database_id));
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = QueryRequest {
                page_size: PAGE_SIZE,
                start_cursor: cursor.as_deref(),
                filter: query.filter.as_ref(),
                sorts: &query.sorts,
            };
            let page: QueryResponse = self
                .send_json(self.request(reqwest::Method::POST, &url).json(&body))
                .await?;

            debug!(count = page.results.len(), has_more = page.has_more, "Fetched query page");
            records.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn fetch_record(&self, id: &str) -> Result<Record> {
        let url = self.url(&format!("pages/{id}"));
        self.send_json(self.request(reqwest::Method::GET, &url)).await
    }
}
