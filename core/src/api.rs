use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{
    NewSavedSearch, NoteListPage, NoteListParams, PopularSearch, SavedSearch, SearchRequest,
    SearchResultSet, SearchStats, SuggestionCandidate, TrendingSearch,
};

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote collaborator the search layer talks to.
///
/// Transport, auth headers and query parsing live on the other side of this
/// trait; implementations only move request and response shapes.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> ApiResult<SearchResultSet>;

    async fn suggestions(&self, prefix: &str, limit: u32) -> ApiResult<Vec<SuggestionCandidate>>;

    async fn list_saved(&self) -> ApiResult<Vec<SavedSearch>>;

    async fn create_saved(&self, saved: &NewSavedSearch) -> ApiResult<SavedSearch>;

    /// Records a use of the saved search and runs it server-side.
    async fn execute_saved(&self, id: i64) -> ApiResult<SearchResultSet>;

    async fn delete_saved(&self, id: i64) -> ApiResult<()>;

    async fn popular(&self, limit: u32) -> ApiResult<Vec<PopularSearch>>;

    async fn trending(&self, limit: u32, days: u32) -> ApiResult<Vec<TrendingSearch>>;

    async fn stats(&self) -> ApiResult<SearchStats>;

    /// Plain, non-search note listing used by the dashboard.
    async fn list_notes(&self, params: &NoteListParams) -> ApiResult<NoteListPage>;
}
