use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::api::SearchApi;
use crate::executor::RunOutcome;
use crate::filter::NoteType;
use crate::models::{NoteListPage, NoteListParams};
use crate::state::Shared;

pub const FETCH_FAILED: &str = "Failed to fetch notes";

/// The dashboard's plain list filter. Not a search; no operators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteListFilter {
    pub search: String,
    pub note_type: Option<NoteType>,
    /// Comma separated, passed through as typed
    pub tags: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteListPatch {
    pub search: Option<String>,
    pub note_type: Option<Option<NoteType>>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteListState {
    pub filter: NoteListFilter,
    pub listing: NoteListPage,
    pub page: u32,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    state: NoteListState,
    issued: u64,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Clone)]
pub struct NoteListStore {
    api: Arc<dyn SearchApi>,
    per_page: u32,
    inner: Shared<Inner>,
}

impl NoteListStore {
    pub fn new(api: Arc<dyn SearchApi>, per_page: u32) -> Self {
        NoteListStore {
            api,
            per_page: per_page.max(1),
            inner: Shared::new(Inner {
                state: NoteListState {
                    page: 1,
                    ..Default::default()
                },
                issued: 0,
            }),
        }
    }

    pub fn state(&self) -> NoteListState {
        self.inner.read(|i| i.state.clone())
    }

    pub fn search(&self) -> String {
        self.inner.read(|i| i.state.filter.search.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }

    /// Merge `patch` into the filter and go back to page 1.
    pub fn set_filters(&self, patch: NoteListPatch) {
        self.inner.update(|i| {
            let filter = &mut i.state.filter;
            if let Some(search) = patch.search {
                filter.search = search;
            }
            if let Some(note_type) = patch.note_type {
                filter.note_type = note_type;
            }
            if let Some(tags) = patch.tags {
                filter.tags = tags;
            }
            i.state.page = 1;
        });
    }

    pub fn set_search(&self, text: &str) {
        self.set_filters(NoteListPatch {
            search: Some(text.to_string()),
            ..Default::default()
        });
    }

    fn params(&self, page: u32) -> NoteListParams {
        self.inner.read(|i| NoteListParams {
            page: page.max(1),
            per_page: self.per_page,
            search: non_empty(&i.state.filter.search),
            note_type: i.state.filter.note_type,
            tags: non_empty(&i.state.filter.tags),
        })
    }

    pub async fn fetch(&self, page: u32) -> RunOutcome {
        let params = self.params(page);
        let seq = self.inner.update(|i| {
            i.issued += 1;
            i.state.is_loading = true;
            i.issued
        });

        debug!(seq, page = params.page, search = ?params.search, "fetching notes");
        let response = self.api.list_notes(&params).await;

        let mut outcome = RunOutcome::Superseded;
        self.inner.update_if(|i| {
            if i.issued != seq {
                return false;
            }
            i.state.is_loading = false;
            match &response {
                Ok(listing) => {
                    i.state.listing = listing.clone();
                    i.state.page = params.page;
                    i.state.error = None;
                    outcome = RunOutcome::Applied;
                }
                Err(err) => {
                    warn!(seq, error = %err, "failed to fetch notes");
                    let message = err.user_message(FETCH_FAILED);
                    i.state.listing = NoteListPage::default();
                    i.state.error = Some(message.clone());
                    outcome = RunOutcome::Failed(message);
                }
            }
            true
        });

        if outcome == RunOutcome::Superseded {
            trace!(seq, "discarding stale note list");
        }
        outcome
    }
}
