use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::api::SearchApi;
use crate::error::{ApiError, SavedSearchError};
use crate::executor::{RunOutcome, SearchExecutor};
use crate::models::{NewSavedSearch, SavedSearch, SearchRequest};
use crate::state::Shared;

const LOAD_FAILED: &str = "Failed to load saved searches";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedSearchState {
    pub items: Vec<SavedSearch>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    state: SavedSearchState,
    refresh_seq: u64,
    execute_seq: u64,
}

/// The detail the server gave, else the error itself.
fn describe(err: &ApiError) -> String {
    err.user_message(&err.to_string())
}

/// Named snapshots of the query filter, stored server-side.
#[derive(Clone)]
pub struct SavedSearchManager {
    api: Arc<dyn SearchApi>,
    executor: SearchExecutor,
    inner: Shared<Inner>,
}

impl SavedSearchManager {
    pub fn new(api: Arc<dyn SearchApi>, executor: SearchExecutor) -> Self {
        SavedSearchManager {
            api,
            executor,
            inner: Shared::default(),
        }
    }

    pub fn state(&self) -> SavedSearchState {
        self.inner.read(|i| i.state.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }

    pub async fn refresh(&self) {
        let seq = self.inner.update(|i| {
            i.refresh_seq += 1;
            i.state.is_loading = true;
            i.refresh_seq
        });

        let result = self.api.list_saved().await;

        self.inner.update_if(|i| {
            if i.refresh_seq != seq {
                return false;
            }
            i.state.is_loading = false;
            match result {
                Ok(items) => {
                    i.state.items = items;
                    i.state.error = None;
                }
                Err(err) => {
                    warn!(error = %err, "failed to load saved searches");
                    i.state.error = Some(err.user_message(LOAD_FAILED));
                }
            }
            true
        });
    }

    /// Store the current filter under `name`.
    pub async fn save(&self, name: &str) -> Result<SavedSearch, SavedSearchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SavedSearchError::EmptyName);
        }

        let filter = self.executor.filter().snapshot();
        let new = NewSavedSearch {
            name: name.to_string(),
            search_query: SearchRequest::from_filter(&filter, 1),
        };

        let created = self.api.create_saved(&new).await.map_err(|err| {
            warn!(error = %err, name, "failed to save search");
            SavedSearchError::SaveFailed(describe(&err))
        })?;

        info!(id = created.id, name, "saved search");
        self.refresh().await;
        Ok(created)
    }

    /// Record a use of `saved`, then load its snapshot and search page 1.
    ///
    /// Nothing local changes unless the usage call succeeds. A newer call
    /// supersedes this one while it waits on the server.
    pub async fn execute(&self, saved: &SavedSearch) -> Result<RunOutcome, SavedSearchError> {
        let seq = self.inner.update(|i| {
            i.execute_seq += 1;
            i.execute_seq
        });

        debug!(seq, id = saved.id, "executing saved search");
        // the server's result set is not used; the executor runs the snapshot
        let recorded = self.api.execute_saved(saved.id).await;

        if self.inner.read(|i| i.execute_seq) != seq {
            trace!(seq, id = saved.id, "saved search execution superseded");
            return Err(SavedSearchError::Superseded);
        }
        if let Err(err) = recorded {
            warn!(error = %err, id = saved.id, "failed to record saved search use");
            return Err(SavedSearchError::ExecuteFailed(describe(&err)));
        }

        self.executor.filter().load_snapshot(&saved.search_query);
        let outcome = self.executor.run(Some(1)).await;
        self.refresh().await;
        Ok(outcome)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SavedSearchError> {
        self.api.delete_saved(id).await.map_err(|err| {
            warn!(error = %err, id, "failed to delete saved search");
            SavedSearchError::DeleteFailed(describe(&err))
        })?;

        self.inner.update(|i| i.state.items.retain(|s| s.id != id));
        self.refresh().await;
        Ok(())
    }
}
