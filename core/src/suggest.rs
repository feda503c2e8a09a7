use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::api::SearchApi;
use crate::config::SearchConfig;
use crate::keys::Key;
use crate::models::SuggestionCandidate;
use crate::state::Shared;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    pub items: Vec<SuggestionCandidate>,
    pub visible: bool,
    /// `None` is the "nothing selected" position above the first item
    pub selected: Option<usize>,
    pub focused: bool,
}

/// Result of feeding a key to the suggestion list.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestKey {
    /// Not a key the list handles in its current state
    Ignored,
    Moved(Option<usize>),
    /// The selected candidate becomes the query
    Commit(String),
    /// List cleared; the caller should clear its query text too
    Dismissed,
}

#[derive(Default)]
struct Inner {
    state: SuggestionState,
    /// Bumped by every input change; a fetch only lands if it still matches
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_pending(&mut self) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
        self.generation
    }

    fn reset_list(&mut self) {
        self.state.items.clear();
        self.state.visible = false;
        self.state.selected = None;
    }
}

/// Debounced query-completion list under the search input.
#[derive(Clone)]
pub struct SuggestionEngine {
    api: Arc<dyn SearchApi>,
    debounce: Duration,
    min_len: usize,
    limit: u32,
    inner: Shared<Inner>,
}

impl SuggestionEngine {
    pub fn new(api: Arc<dyn SearchApi>, config: &SearchConfig) -> Self {
        SuggestionEngine {
            api,
            debounce: config.suggestion_debounce,
            min_len: config.min_suggestion_len,
            limit: config.suggestion_limit,
            inner: Shared::default(),
        }
    }

    pub fn state(&self) -> SuggestionState {
        self.inner.read(|i| i.state.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }

    /// Reschedule the fetch for `text`. The previous timer is aborted
    /// before it can fire.
    pub fn on_input(&self, text: &str) {
        let prefix = text.trim().to_string();

        self.inner.update(|inner| {
            let generation = inner.cancel_pending();

            if prefix.chars().count() < self.min_len {
                inner.reset_list();
                return;
            }

            let engine = self.clone();
            let debounce = self.debounce;
            inner.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(debounce).await;
                engine.fetch(generation, prefix).await;
            }));
        });
    }

    async fn fetch(&self, generation: u64, prefix: String) {
        debug!(generation, prefix = %prefix, "fetching suggestions");
        let result = self.api.suggestions(&prefix, self.limit).await;

        self.inner.update_if(|inner| {
            if inner.generation != generation {
                trace!(generation, "discarding stale suggestions");
                return false;
            }
            inner.pending = None;

            match result {
                Ok(items) if inner.state.focused => {
                    inner.state.visible = !items.is_empty();
                    inner.state.items = items;
                    inner.state.selected = None;
                }
                Ok(_) => {
                    trace!(generation, "input lost focus, suggestions not shown");
                    inner.reset_list();
                }
                Err(err) => {
                    warn!(error = %err, prefix = %prefix, "failed to fetch suggestions");
                    inner.reset_list();
                }
            }
            true
        });
    }

    pub fn on_focus(&self) {
        self.inner.update(|inner| {
            inner.state.focused = true;
            inner.state.visible = !inner.state.items.is_empty();
        });
    }

    /// Candidates are dropped, not kept for the next focus.
    pub fn on_blur(&self) {
        self.inner.update(|inner| {
            inner.state.focused = false;
            inner.reset_list();
        });
    }

    /// Hide the list and stop anything scheduled from opening it again.
    pub fn dismiss(&self) {
        self.inner.update(|inner| {
            inner.cancel_pending();
            inner.reset_list();
        });
    }

    /// Pointer selection of the candidate at `index`.
    pub fn select(&self, index: usize) -> Option<String> {
        let text = self
            .inner
            .read(|inner| inner.state.items.get(index).map(|c| c.query_text.clone()))?;
        self.dismiss();
        Some(text)
    }

    pub fn handle_key(&self, key: Key) -> SuggestKey {
        if key == Key::Escape {
            self.dismiss();
            return SuggestKey::Dismissed;
        }

        let (visible, len, selected) = self.inner.read(|inner| {
            (
                inner.state.visible,
                inner.state.items.len(),
                inner.state.selected,
            )
        });
        if !visible || len == 0 {
            return SuggestKey::Ignored;
        }

        match key {
            Key::ArrowDown => {
                let next = match selected {
                    None => Some(0),
                    Some(i) => Some((i + 1).min(len - 1)),
                };
                self.move_to(next)
            }
            Key::ArrowUp => {
                let next = match selected {
                    None | Some(0) => None,
                    Some(i) => Some(i - 1),
                };
                self.move_to(next)
            }
            Key::Enter => match selected.and_then(|i| self.select(i)) {
                Some(text) => SuggestKey::Commit(text),
                None => SuggestKey::Ignored,
            },
            _ => SuggestKey::Ignored,
        }
    }

    fn move_to(&self, selected: Option<usize>) -> SuggestKey {
        self.inner.update(|inner| inner.state.selected = selected);
        SuggestKey::Moved(selected)
    }
}
