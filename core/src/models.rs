use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::{NoteType, QueryFilter, TagMode, DEFAULT_SORT};

/// Body of `POST /search`, also stored verbatim inside a saved search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub tag_mode: TagMode,
    #[serde(default)]
    pub exclude_tags: Option<Vec<String>>,
    #[serde(default)]
    pub note_type: Option<NoteType>,
    #[serde(default)]
    pub created_after: Option<NaiveDate>,
    #[serde(default)]
    pub created_before: Option<NaiveDate>,
    #[serde(default)]
    pub updated_after: Option<NaiveDate>,
    #[serde(default)]
    pub updated_before: Option<NaiveDate>,
    #[serde(default)]
    pub title_only: bool,
    #[serde(default)]
    pub has_attachments: Option<bool>,
    #[serde(default = "default_sort")]
    pub sort_by: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_sort() -> String {
    DEFAULT_SORT.to_string()
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    crate::filter::DEFAULT_PER_PAGE
}

/// Empty collections are "no constraint" and go out as `null`.
fn non_empty_set(values: &BTreeSet<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect())
    }
}

fn non_empty_text(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

impl SearchRequest {
    /// Build the outbound request for `page`, normalizing empty values to absent.
    pub fn from_filter(filter: &QueryFilter, page: u32) -> Self {
        SearchRequest {
            query: non_empty_text(&filter.query),
            tags: non_empty_set(&filter.tags),
            tag_mode: filter.tag_mode,
            exclude_tags: non_empty_set(&filter.exclude_tags),
            note_type: filter.note_type,
            created_after: filter.created_after,
            created_before: filter.created_before,
            updated_after: filter.updated_after,
            updated_before: filter.updated_before,
            title_only: filter.title_only,
            has_attachments: filter.has_attachments,
            sort_by: non_empty_text(filter.sort_by.trim()).unwrap_or_else(default_sort),
            page: page.max(1),
            per_page: filter.per_page.max(1),
        }
    }
}

/// One hit in a search result page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub note_type: Option<NoteType>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relevance_score: f64,
    /// Where the terms matched: `title`, `content`, `tags`
    #[serde(default)]
    pub match_locations: Vec<String>,
}

/// Response of `POST /search` and of saved search execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultSet {
    #[serde(rename = "results")]
    pub items: Vec<ResultItem>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(default)]
    pub execution_time_ms: f64,
}

impl Default for SearchResultSet {
    fn default() -> Self {
        SearchResultSet {
            items: vec![],
            total: 0,
            page: 1,
            per_page: crate::filter::DEFAULT_PER_PAGE,
            has_next: false,
            has_prev: false,
            execution_time_ms: 0.0,
        }
    }
}

impl SearchResultSet {
    /// Whether the engine's paging flags agree with its own totals.
    pub fn is_consistent(&self) -> bool {
        let shown = u64::from(self.page) * u64::from(self.per_page);
        self.has_next == (shown < self.total) && self.has_prev == (self.page > 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Autocomplete entry from `GET /search/suggestions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionCandidate {
    pub query_text: String,
    #[serde(default)]
    pub search_count: u32,
    #[serde(default)]
    pub relevance_score: f64,
}

impl SuggestionCandidate {
    pub fn is_hot(&self) -> bool {
        self.relevance_score > 0.7
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSearch {
    pub id: i64,
    pub name: String,
    pub search_query: SearchRequest,
    #[serde(default)]
    pub use_count: u32,
    #[serde(default, with = "timestamp::option")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedSearch {
    /// One-line description of what the saved search filters on.
    pub fn summary(&self) -> String {
        let q = &self.search_query;
        let mut parts = vec![];

        if let Some(query) = q.query.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("\"{}\"", query));
        }

        if let Some(tags) = q.tags.as_ref().filter(|t| !t.is_empty()) {
            let more = if tags.len() > 2 { "..." } else { "" };
            parts.push(format!("Tags: {}{}", tags[..tags.len().min(2)].join(", "), more));
        }

        if let Some(tags) = q.exclude_tags.as_ref().filter(|t| !t.is_empty()) {
            let more = if tags.len() > 1 { "..." } else { "" };
            parts.push(format!("Exclude: {}{}", tags[0], more));
        }

        if let Some(note_type) = q.note_type {
            let name = match note_type {
                NoteType::Text => "text",
                NoteType::Structured => "structured",
            };
            parts.push(format!("Type: {}", name));
        }

        if parts.is_empty() {
            "Empty search".to_string()
        } else {
            parts.join(" · ")
        }
    }
}

/// Body of `POST /search/saved`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSavedSearch {
    pub name: String,
    pub search_query: SearchRequest,
}

/// `GET /search/saved` comes back either wrapped or as a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SavedSearchListing {
    Wrapped { saved_searches: Vec<SavedSearch> },
    Bare(Vec<SavedSearch>),
}

impl From<SavedSearchListing> for Vec<SavedSearch> {
    fn from(listing: SavedSearchListing) -> Self {
        match listing {
            SavedSearchListing::Wrapped { saved_searches } => saved_searches,
            SavedSearchListing::Bare(list) => list,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularSearch {
    pub query_text: String,
    pub search_count: u32,
    #[serde(default, with = "timestamp::option")]
    pub last_searched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avg_result_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingSearch {
    pub query_text: String,
    pub search_count: u32,
    pub recent_search_count: u32,
    pub trend_direction: TrendDirection,
    #[serde(default, with = "timestamp::option")]
    pub last_searched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchStats {
    pub total_searches: u64,
    pub unique_queries: u64,
    #[serde(default)]
    pub avg_results_per_search: Option<f64>,
    #[serde(default)]
    pub most_searched_query: Option<String>,
    #[serde(default)]
    pub searches_today: u64,
    #[serde(default)]
    pub searches_this_week: u64,
}

/// Query parameters for the plain note list. Empty values are left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteListParams {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub note_type: Option<NoteType>,
    /// Markdown text or a map of section name to markdown
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteListPage {
    pub notes: Vec<NoteSummary>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

impl Default for NoteListPage {
    fn default() -> Self {
        NoteListPage {
            notes: vec![],
            total: 0,
            page: 1,
            per_page: 10,
            has_next: false,
            has_prev: false,
        }
    }
}

/// Timestamps arrive as RFC 3339 or as naive ISO 8601 (read as UTC).
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::filter::{FilterChange, FilterPatch};
    use serde_json::json;

    #[test]
    fn test_empty_tags_serialize_as_null() {
        let mut filter = QueryFilter::default();
        filter.set_filters(FilterPatch {
            tags: Some(vec!["work".to_string()]),
            ..Default::default()
        });
        filter.set_filters(FilterPatch {
            tags: Some(vec![]),
            ..Default::default()
        });

        let request = SearchRequest::from_filter(&filter, 1);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["tags"], serde_json::Value::Null);
        assert_eq!(body["exclude_tags"], serde_json::Value::Null);
        assert_eq!(body["query"], serde_json::Value::Null);
    }

    #[test]
    fn test_request_wire_shape() {
        let mut filter = QueryFilter::default();
        filter.set_query("budget");
        filter.set_filter(FilterChange::Tags(vec!["work".to_string()]));
        filter.set_filter(FilterChange::TagMode(TagMode::Or));
        filter.set_filter(FilterChange::NoteType(Some(NoteType::Structured)));
        filter.set_filter(FilterChange::CreatedAfter(Some(
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
        )));

        let body = serde_json::to_value(SearchRequest::from_filter(&filter, 3)).unwrap();

        assert_eq!(
            body,
            json!({
                "query": "budget",
                "tags": ["work"],
                "tag_mode": "or",
                "exclude_tags": null,
                "note_type": "structured",
                "created_after": "2024-10-01",
                "created_before": null,
                "updated_after": null,
                "updated_before": null,
                "title_only": false,
                "has_attachments": null,
                "sort_by": "relevance",
                "page": 3,
                "per_page": 20
            })
        );
    }

    #[test]
    fn test_blank_sort_falls_back_to_relevance() {
        let mut filter = QueryFilter::default();
        filter.set_filter(FilterChange::SortBy(" ".to_string()));
        assert_eq!(SearchRequest::from_filter(&filter, 1).sort_by, "relevance");
    }

    #[test]
    fn test_result_set_decodes_naive_timestamps() {
        let body = json!({
            "results": [{
                "id": 7,
                "title": "Weekly meeting",
                "note_type": "text",
                "snippet": "...agenda for the meeting...",
                "tags": ["work"],
                "user_id": 1,
                "created_at": "2024-10-01T09:30:00",
                "updated_at": "2024-10-02T10:00:00.123+02:00",
                "relevance_score": 0.8,
                "match_locations": ["title", "content"]
            }],
            "total": 21,
            "page": 1,
            "per_page": 20,
            "has_next": true,
            "has_prev": false,
            "execution_time_ms": 12.5
        });

        let set: SearchResultSet = serde_json::from_value(body).unwrap();

        assert_eq!(set.items.len(), 1);
        assert_eq!(set.items[0].note_type, Some(NoteType::Text));
        assert_eq!(
            set.items[0].created_at.unwrap().to_rfc3339(),
            "2024-10-01T09:30:00+00:00"
        );
        assert!(set.is_consistent());
    }

    #[test]
    fn test_inconsistent_paging_flags_detected() {
        let set = SearchResultSet {
            total: 20,
            page: 1,
            per_page: 20,
            has_next: true,
            ..Default::default()
        };
        assert!(!set.is_consistent());
    }

    #[test]
    fn test_saved_search_listing_shapes() {
        let item = json!({
            "id": 1,
            "name": "Work",
            "search_query": {"query": "tag:work", "page": 1, "per_page": 20},
            "use_count": 3,
            "last_used_at": null
        });

        let wrapped: SavedSearchListing =
            serde_json::from_value(json!({ "saved_searches": [item.clone()] })).unwrap();
        let bare: SavedSearchListing = serde_json::from_value(json!([item])).unwrap();

        let wrapped: Vec<SavedSearch> = wrapped.into();
        let bare: Vec<SavedSearch> = bare.into();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[0].search_query.sort_by, "relevance");
        assert_eq!(wrapped[0].search_query.tag_mode, TagMode::And);
    }

    #[test]
    fn test_saved_search_summary() {
        let mut filter = QueryFilter::default();
        filter.set_query("roadmap");
        filter.set_filter(FilterChange::Tags(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ]));
        filter.set_filter(FilterChange::ExcludeTags(vec!["x".to_string()]));
        filter.set_filter(FilterChange::NoteType(Some(NoteType::Text)));

        let saved = SavedSearch {
            id: 1,
            name: "Roadmap".to_string(),
            search_query: SearchRequest::from_filter(&filter, 1),
            use_count: 0,
            last_used_at: None,
            created_at: None,
        };

        assert_eq!(
            saved.summary(),
            "\"roadmap\" · Tags: a, b... · Exclude: x · Type: text"
        );

        let empty = SavedSearch {
            search_query: SearchRequest::from_filter(&QueryFilter::default(), 1),
            ..saved
        };
        assert_eq!(empty.summary(), "Empty search");
    }

    #[test]
    fn test_note_list_params_skip_empty() {
        let params = NoteListParams {
            page: 2,
            per_page: 10,
            search: None,
            note_type: Some(NoteType::Text),
            tags: None,
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({"page": 2, "per_page": 10, "note_type": "text"})
        );
    }
}
