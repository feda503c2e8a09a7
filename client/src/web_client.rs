use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use jot_search_core::{
    ApiError, ApiResult, NewSavedSearch, NoteListPage, NoteListParams, PopularSearch,
    SavedSearch, SavedSearchListing, SearchApi, SearchRequest, SearchResultSet, SearchStats,
    SuggestionCandidate, TrendingSearch,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app_config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `{ "detail": ... }` payload the server sends with errors.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull a readable message out of an error body. Validation failures carry
/// a list of `{ msg }` objects instead of a string.
fn error_detail(body: &str) -> Option<String> {
    let body: ErrorBody = serde_json::from_str(body).ok()?;

    match body.detail {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

/// [`SearchApi`] over HTTP with reqwest.
pub struct WebClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl WebClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(WebClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        WebClient::new(config.api_url.clone(), config.token.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and map transport failures and non-2xx statuses.
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!(status = status.as_u16(), detail = ?detail, "server returned an error");
        Err(ApiError::status(status.as_u16(), detail))
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchApi for WebClient {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchResultSet> {
        self.fetch(self.request(Method::POST, "/search").json(request))
            .await
    }

    async fn suggestions(&self, prefix: &str, limit: u32) -> ApiResult<Vec<SuggestionCandidate>> {
        let limit = limit.to_string();
        self.fetch(
            self.request(Method::GET, "/search/suggestions")
                .query(&[("q", prefix), ("limit", limit.as_str())]),
        )
        .await
    }

    async fn list_saved(&self) -> ApiResult<Vec<SavedSearch>> {
        let listing: SavedSearchListing =
            self.fetch(self.request(Method::GET, "/search/saved")).await?;
        Ok(listing.into())
    }

    async fn create_saved(&self, saved: &NewSavedSearch) -> ApiResult<SavedSearch> {
        self.fetch(self.request(Method::POST, "/search/saved").json(saved))
            .await
    }

    async fn execute_saved(&self, id: i64) -> ApiResult<SearchResultSet> {
        let path = format!("/search/saved/{}/execute", id);
        self.fetch(self.request(Method::POST, &path)).await
    }

    async fn delete_saved(&self, id: i64) -> ApiResult<()> {
        let path = format!("/search/saved/{}", id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn popular(&self, limit: u32) -> ApiResult<Vec<PopularSearch>> {
        self.fetch(
            self.request(Method::GET, "/analytics/popular")
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn trending(&self, limit: u32, days: u32) -> ApiResult<Vec<TrendingSearch>> {
        self.fetch(
            self.request(Method::GET, "/analytics/trending")
                .query(&[("limit", limit), ("days", days)]),
        )
        .await
    }

    async fn stats(&self) -> ApiResult<SearchStats> {
        self.fetch(self.request(Method::GET, "/analytics/stats"))
            .await
    }

    async fn list_notes(&self, params: &NoteListParams) -> ApiResult<NoteListPage> {
        self.fetch(self.request(Method::GET, "/notes/").query(params))
            .await
    }
}
