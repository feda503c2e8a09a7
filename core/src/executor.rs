use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::api::SearchApi;
use crate::filter::SharedFilter;
use crate::highlight::HighlightTerms;
use crate::models::{SearchRequest, SearchResultSet};
use crate::state::Shared;

pub const SEARCH_FAILED: &str = "Search failed";

/// What the view renders for the search results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub results: SearchResultSet,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Derived from the query of the applied request
    pub highlight_terms: HighlightTerms,
}

#[derive(Default)]
struct Tracked {
    state: SearchState,
    /// Sequence number of the latest issued request
    issued: u64,
}

/// How a single `run` ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Applied,
    Failed(String),
    /// A newer request was issued; this response was dropped.
    Superseded,
}

/// Sends the current filter to the search collaborator and owns the result.
///
/// Every request is tagged with a monotonically increasing sequence number.
/// Only the response to the latest issued request may touch the stored
/// state, whatever order responses arrive in.
#[derive(Clone)]
pub struct SearchExecutor {
    api: Arc<dyn SearchApi>,
    filter: SharedFilter,
    tracked: Shared<Tracked>,
}

impl SearchExecutor {
    pub fn new(api: Arc<dyn SearchApi>, filter: SharedFilter) -> Self {
        SearchExecutor {
            api,
            filter,
            tracked: Shared::default(),
        }
    }

    pub fn filter(&self) -> &SharedFilter {
        &self.filter
    }

    pub fn state(&self) -> SearchState {
        self.tracked.read(|t| t.state.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tracked.subscribe()
    }

    pub async fn run(&self, page_override: Option<u32>) -> RunOutcome {
        let filter = self.filter.snapshot();
        let request = SearchRequest::from_filter(&filter, page_override.unwrap_or(filter.page));

        let seq = self.tracked.update(|t| {
            t.issued += 1;
            t.state.is_loading = true;
            t.issued
        });

        debug!(seq, page = request.page, query = ?request.query, "dispatching search");
        let response = self.api.search(&request).await;

        let mut outcome = RunOutcome::Superseded;
        self.tracked.update_if(|t| {
            if t.issued != seq {
                return false;
            }

            t.state.is_loading = false;
            match &response {
                Ok(results) => {
                    if !results.is_consistent() {
                        warn!(
                            seq,
                            page = results.page,
                            total = results.total,
                            "paging flags disagree with totals"
                        );
                    }
                    t.state.results = results.clone();
                    t.state.error = None;
                    t.state.highlight_terms =
                        HighlightTerms::from_query(request.query.as_deref().unwrap_or_default());
                    outcome = RunOutcome::Applied;
                }
                Err(err) => {
                    let message = err.user_message(SEARCH_FAILED);
                    warn!(seq, error = %err, "search failed");
                    t.state.results = SearchResultSet::default();
                    t.state.highlight_terms = HighlightTerms::default();
                    t.state.error = Some(message.clone());
                    outcome = RunOutcome::Failed(message);
                }
            }
            true
        });

        if outcome == RunOutcome::Superseded {
            trace!(seq, "discarding stale search response");
        }
        outcome
    }

    /// Move to `page` of the current search.
    pub async fn go_to_page(&self, page: u32) -> RunOutcome {
        self.filter.set_page(page);
        self.run(None).await
    }

    /// Forget the query and results. Responses still in flight are dropped.
    pub fn clear(&self) {
        self.filter.set_query("");
        self.tracked.update(|t| {
            t.issued += 1;
            t.state = SearchState::default();
        });
    }
}
