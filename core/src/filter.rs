use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::SearchRequest;
use crate::state::Shared;

pub const DEFAULT_SORT: &str = "relevance";
pub const DEFAULT_PER_PAGE: u32 = 20;

/// How include-tags combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Text,
    Structured,
}

/// What the user currently wants to search for.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    /// Free text, may carry operators only the server understands
    pub query: String,
    pub tags: BTreeSet<String>,
    pub exclude_tags: BTreeSet<String>,
    pub tag_mode: TagMode,
    pub note_type: Option<NoteType>,
    pub created_after: Option<NaiveDate>,
    pub created_before: Option<NaiveDate>,
    pub updated_after: Option<NaiveDate>,
    pub updated_before: Option<NaiveDate>,
    pub title_only: bool,
    pub has_attachments: Option<bool>,
    /// Opaque to the client, the engine owns the valid set
    pub sort_by: String,
    /// 1-indexed
    pub page: u32,
    pub per_page: u32,
}

impl Default for QueryFilter {
    fn default() -> Self {
        QueryFilter {
            query: String::new(),
            tags: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            tag_mode: TagMode::And,
            note_type: None,
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            title_only: false,
            has_attachments: None,
            sort_by: DEFAULT_SORT.to_string(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// A single named field update.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Tags(Vec<String>),
    ExcludeTags(Vec<String>),
    TagMode(TagMode),
    NoteType(Option<NoteType>),
    CreatedAfter(Option<NaiveDate>),
    CreatedBefore(Option<NaiveDate>),
    UpdatedAfter(Option<NaiveDate>),
    UpdatedBefore(Option<NaiveDate>),
    TitleOnly(bool),
    HasAttachments(Option<bool>),
    SortBy(String),
    PerPage(u32),
    Page(u32),
}

/// Partial update merged over the current filter. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub query: Option<String>,
    pub tags: Option<Vec<String>>,
    pub exclude_tags: Option<Vec<String>>,
    pub tag_mode: Option<TagMode>,
    pub note_type: Option<Option<NoteType>>,
    pub created_after: Option<Option<NaiveDate>>,
    pub created_before: Option<Option<NaiveDate>>,
    pub updated_after: Option<Option<NaiveDate>>,
    pub updated_before: Option<Option<NaiveDate>>,
    pub title_only: Option<bool>,
    pub has_attachments: Option<Option<bool>>,
    pub sort_by: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl FilterPatch {
    /// Split into the individual changes it carries.
    fn into_changes(self) -> (Option<String>, Vec<FilterChange>) {
        let mut changes = Vec::new();

        if let Some(v) = self.tags {
            changes.push(FilterChange::Tags(v));
        }
        if let Some(v) = self.exclude_tags {
            changes.push(FilterChange::ExcludeTags(v));
        }
        if let Some(v) = self.tag_mode {
            changes.push(FilterChange::TagMode(v));
        }
        if let Some(v) = self.note_type {
            changes.push(FilterChange::NoteType(v));
        }
        if let Some(v) = self.created_after {
            changes.push(FilterChange::CreatedAfter(v));
        }
        if let Some(v) = self.created_before {
            changes.push(FilterChange::CreatedBefore(v));
        }
        if let Some(v) = self.updated_after {
            changes.push(FilterChange::UpdatedAfter(v));
        }
        if let Some(v) = self.updated_before {
            changes.push(FilterChange::UpdatedBefore(v));
        }
        if let Some(v) = self.title_only {
            changes.push(FilterChange::TitleOnly(v));
        }
        if let Some(v) = self.has_attachments {
            changes.push(FilterChange::HasAttachments(v));
        }
        if let Some(v) = self.sort_by {
            changes.push(FilterChange::SortBy(v));
        }
        if let Some(v) = self.per_page {
            changes.push(FilterChange::PerPage(v));
        }
        if let Some(v) = self.page {
            changes.push(FilterChange::Page(v));
        }

        (self.query, changes)
    }
}

/// Whitespace-only text is no query at all. Anything else is kept as typed.
fn normalize_query(text: &str) -> String {
    if text.trim().is_empty() {
        String::new()
    } else {
        text.to_string()
    }
}

fn normalize_sort(sort_by: &str) -> String {
    match sort_by.trim() {
        "" => DEFAULT_SORT.to_string(),
        v => v.to_string(),
    }
}

fn to_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl QueryFilter {
    pub fn set_query(&mut self, text: &str) {
        self.query = normalize_query(text);
        self.page = 1;
    }

    /// Apply one change. Anything but a page change sends pagination back to 1.
    pub fn set_filter(&mut self, change: FilterChange) {
        let resets_page = !matches!(change, FilterChange::Page(_));
        self.apply(change);
        if resets_page {
            self.page = 1;
        }
    }

    pub fn set_filters(&mut self, patch: FilterPatch) {
        let (query, changes) = patch.into_changes();
        let only_page =
            query.is_none() && changes.iter().all(|c| matches!(c, FilterChange::Page(_)));

        if let Some(query) = query {
            self.query = normalize_query(&query);
        }
        for change in changes {
            self.apply(change);
        }
        if !only_page {
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.set_filter(FilterChange::Page(page));
    }

    /// Restore facet defaults, keeping the query text and sort order.
    pub fn reset_filters(&mut self) {
        let defaults = QueryFilter::default();
        *self = QueryFilter {
            query: std::mem::take(&mut self.query),
            sort_by: std::mem::take(&mut self.sort_by),
            per_page: self.per_page,
            ..defaults
        };
    }

    pub fn clear(&mut self) {
        *self = QueryFilter {
            per_page: self.per_page,
            ..QueryFilter::default()
        };
    }

    fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::Tags(v) => self.tags = to_set(v),
            FilterChange::ExcludeTags(v) => self.exclude_tags = to_set(v),
            FilterChange::TagMode(v) => self.tag_mode = v,
            FilterChange::NoteType(v) => self.note_type = v,
            FilterChange::CreatedAfter(v) => self.created_after = v,
            FilterChange::CreatedBefore(v) => self.created_before = v,
            FilterChange::UpdatedAfter(v) => self.updated_after = v,
            FilterChange::UpdatedBefore(v) => self.updated_before = v,
            FilterChange::TitleOnly(v) => self.title_only = v,
            FilterChange::HasAttachments(v) => self.has_attachments = v,
            FilterChange::SortBy(v) => self.sort_by = normalize_sort(&v),
            FilterChange::PerPage(v) => self.per_page = v.max(1),
            FilterChange::Page(v) => self.page = v.max(1),
        }
    }

    /// Number of facet groups currently constraining the search.
    pub fn active_filter_count(&self) -> usize {
        [
            !self.tags.is_empty(),
            !self.exclude_tags.is_empty(),
            self.note_type.is_some(),
            self.created_after.is_some() || self.created_before.is_some(),
            self.updated_after.is_some() || self.updated_before.is_some(),
            self.title_only,
            self.has_attachments.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Rebuild a filter from a stored request. Pagination restarts at 1.
    pub fn from_request(request: &SearchRequest) -> Self {
        QueryFilter {
            query: request.query.as_deref().map(normalize_query).unwrap_or_default(),
            tags: to_set(request.tags.clone().unwrap_or_default()),
            exclude_tags: to_set(request.exclude_tags.clone().unwrap_or_default()),
            tag_mode: request.tag_mode,
            note_type: request.note_type,
            created_after: request.created_after,
            created_before: request.created_before,
            updated_after: request.updated_after,
            updated_before: request.updated_before,
            title_only: request.title_only,
            has_attachments: request.has_attachments,
            sort_by: normalize_sort(&request.sort_by),
            page: 1,
            per_page: request.per_page.max(1),
        }
    }

    pub fn load_snapshot(&mut self, request: &SearchRequest) {
        *self = QueryFilter::from_request(request);
    }
}

/// Injected, observable handle to the one live [`QueryFilter`].
///
/// Every mutation goes through a named action. Observers are notified only
/// when the filter actually changed.
#[derive(Clone, Default)]
pub struct SharedFilter {
    state: Shared<QueryFilter>,
}

impl SharedFilter {
    pub fn new(filter: QueryFilter) -> Self {
        SharedFilter {
            state: Shared::new(filter),
        }
    }

    fn update(&self, action: impl FnOnce(&mut QueryFilter)) {
        self.state.update_if(|filter| {
            let before = filter.clone();
            action(filter);
            *filter != before
        });
    }

    pub fn snapshot(&self) -> QueryFilter {
        self.state.get()
    }

    pub fn query(&self) -> String {
        self.state.read(|f| f.query.clone())
    }

    pub fn page(&self) -> u32 {
        self.state.read(|f| f.page)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    pub fn set_query(&self, text: &str) {
        self.update(|f| f.set_query(text));
    }

    pub fn set_filter(&self, change: FilterChange) {
        self.update(|f| f.set_filter(change));
    }

    pub fn set_filters(&self, patch: FilterPatch) {
        self.update(|f| f.set_filters(patch));
    }

    pub fn set_page(&self, page: u32) {
        self.update(|f| f.set_page(page));
    }

    pub fn reset_filters(&self) {
        self.update(QueryFilter::reset_filters);
    }

    pub fn clear(&self) {
        self.update(QueryFilter::clear);
    }

    pub fn load_snapshot(&self, request: &SearchRequest) {
        self.update(|f| f.load_snapshot(request));
    }
}
