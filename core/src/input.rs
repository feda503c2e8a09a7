use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::executor::{RunOutcome, SearchExecutor};
use crate::keys::{Key, KeyEvent};
use crate::notes::NoteListStore;
use crate::state::Shared;
use crate::suggest::{SuggestKey, SuggestionEngine};

/// Where the input lives decides what typing does. The caller says which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Typing filters the dashboard note list
    LiveFilter,
    /// Typing re-runs the search on the results page
    SearchPage,
    /// Typing only suggests; submit to search
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SearchResults,
}

/// Moves the host application between views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyHandled {
    Ignored,
    Focused,
    /// Escape: text cleared, input blurred, list hidden
    Cleared,
    Suggestion(SuggestKey),
    Submitted(RunOutcome),
}

struct Inner {
    text: String,
    focused: bool,
    mode: InputMode,
    /// Live write still in its quiet period
    pending: Option<JoinHandle<()>>,
    scheduled: u64,
}

impl Inner {
    fn cancel_pending(&mut self) {
        self.scheduled += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Called by the write task once its delay is over. From here on the
    /// request is left to the sequence guards instead of being aborted.
    fn claim(&mut self, scheduled: u64) -> bool {
        if self.scheduled != scheduled {
            return false;
        }
        self.pending = None;
        true
    }
}

/// The search box shared by the navbar, dashboard and results page.
#[derive(Clone)]
pub struct DualModeSearchInput {
    executor: SearchExecutor,
    notes: NoteListStore,
    suggestions: SuggestionEngine,
    navigator: Arc<dyn Navigator>,
    debounce: Duration,
    inner: Shared<Inner>,
}

impl DualModeSearchInput {
    pub fn new(
        executor: SearchExecutor,
        notes: NoteListStore,
        suggestions: SuggestionEngine,
        navigator: Arc<dyn Navigator>,
        debounce: Duration,
        mode: InputMode,
    ) -> Self {
        DualModeSearchInput {
            executor,
            notes,
            suggestions,
            navigator,
            debounce,
            inner: Shared::new(Inner {
                text: String::new(),
                focused: false,
                mode,
                pending: None,
                scheduled: 0,
            }),
        }
    }

    pub fn text(&self) -> String {
        self.inner.read(|i| i.text.clone())
    }

    pub fn mode(&self) -> InputMode {
        self.inner.read(|i| i.mode)
    }

    pub fn is_focused(&self) -> bool {
        self.inner.read(|i| i.focused)
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    /// The host navigated. A live write scheduled under the old mode is dropped.
    pub fn set_mode(&self, mode: InputMode) {
        self.inner.update(|i| {
            i.cancel_pending();
            i.mode = mode;
        });
    }

    pub fn on_input(&self, text: &str) {
        self.suggestions.on_input(text);

        let text = text.to_string();
        self.inner.update(|i| {
            i.cancel_pending();
            i.text = text.clone();
            if i.mode == InputMode::Standalone {
                return;
            }

            let input = self.clone();
            let debounce = self.debounce;
            let mode = i.mode;
            let scheduled = i.scheduled;
            i.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(debounce).await;
                if input.inner.update(|i| i.claim(scheduled)) {
                    input.live_write(mode, &text).await;
                }
            }));
        });
    }

    async fn live_write(&self, mode: InputMode, text: &str) {
        match mode {
            InputMode::LiveFilter => {
                if text != self.notes.search() {
                    debug!(search = text, "live note filter");
                    self.notes.set_search(text);
                    self.notes.fetch(1).await;
                }
            }
            InputMode::SearchPage => {
                let text = text.trim();
                let current = self.executor.filter().query();
                if text == current {
                    return;
                }
                if !text.is_empty() {
                    debug!(query = text, "live search");
                    self.executor.filter().set_query(text);
                    self.executor.run(Some(1)).await;
                } else if !current.is_empty() {
                    self.executor.clear();
                }
            }
            InputMode::Standalone => {}
        }
    }

    pub fn focus(&self) {
        self.inner.update(|i| i.focused = true);
        self.suggestions.on_focus();
    }

    pub fn blur(&self) {
        self.inner.update(|i| i.focused = false);
        self.suggestions.on_blur();
    }

    /// Search for the typed text and show the results view.
    /// Blank text does nothing.
    pub async fn submit(&self) -> Option<RunOutcome> {
        let text = self.inner.update(|i| {
            i.cancel_pending();
            i.text.trim().to_string()
        });
        if text.is_empty() {
            return None;
        }

        self.suggestions.dismiss();
        self.executor.filter().set_query(&text);
        let outcome = self.executor.run(Some(1)).await;
        self.navigator.navigate(Route::SearchResults);
        Some(outcome)
    }

    /// Make `text` the query, from a clicked or keyboard-chosen suggestion.
    pub async fn commit_suggestion(&self, text: &str) -> RunOutcome {
        let mode = self.inner.update(|i| {
            i.cancel_pending();
            i.text = text.to_string();
            i.mode
        });

        self.suggestions.dismiss();
        self.executor.filter().set_query(text);
        let outcome = self.executor.run(Some(1)).await;
        if mode != InputMode::SearchPage {
            self.navigator.navigate(Route::SearchResults);
        }
        outcome
    }

    /// Empty the box and undo what the text was driving in this mode.
    pub async fn clear(&self) {
        let mode = self.inner.update(|i| {
            i.cancel_pending();
            i.text.clear();
            i.mode
        });
        self.suggestions.dismiss();

        match mode {
            InputMode::SearchPage => self.executor.clear(),
            InputMode::LiveFilter => {
                self.notes.set_search("");
                self.notes.fetch(1).await;
            }
            InputMode::Standalone => {}
        }
    }

    /// Escape is handled here before the suggestion list can see it.
    pub async fn handle_key(&self, event: KeyEvent) -> KeyHandled {
        if event.is_focus_chord() {
            self.focus();
            return KeyHandled::Focused;
        }
        if !self.is_focused() {
            return KeyHandled::Ignored;
        }

        match event.key {
            Key::Escape => {
                self.clear().await;
                self.blur();
                KeyHandled::Cleared
            }
            Key::ArrowDown | Key::ArrowUp | Key::Enter if self.suggestions.state().visible => {
                match self.suggestions.handle_key(event.key) {
                    SuggestKey::Commit(text) => {
                        KeyHandled::Submitted(self.commit_suggestion(&text).await)
                    }
                    SuggestKey::Ignored if event.key == Key::Enter => self.submit_key().await,
                    other => KeyHandled::Suggestion(other),
                }
            }
            Key::Enter => self.submit_key().await,
            _ => KeyHandled::Ignored,
        }
    }

    async fn submit_key(&self) -> KeyHandled {
        match self.submit().await {
            Some(outcome) => KeyHandled::Submitted(outcome),
            None => KeyHandled::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::SearchConfig;
    use crate::filter::SharedFilter;
    use crate::models::NoteListPage;
    use crate::test::fake_api::{note, result_page, FakeApi};
    use crate::test::{settle, RecordingNavigator};

    struct Fixture {
        api: Arc<FakeApi>,
        navigator: Arc<RecordingNavigator>,
        executor: SearchExecutor,
        notes: NoteListStore,
        input: DualModeSearchInput,
    }

    fn fixture(mode: InputMode) -> Fixture {
        let api = Arc::new(FakeApi::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let config = SearchConfig::default();
        let executor = SearchExecutor::new(api.clone(), SharedFilter::default());
        let notes = NoteListStore::new(api.clone(), config.note_list_per_page);
        let suggestions = SuggestionEngine::new(api.clone(), &config);
        let input = DualModeSearchInput::new(
            executor.clone(),
            notes.clone(),
            suggestions,
            navigator.clone(),
            config.live_search_debounce,
            mode,
        );
        Fixture {
            api,
            navigator,
            executor,
            notes,
            input,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_filter_debounces_note_list() {
        let f = fixture(InputMode::LiveFilter);

        f.input.on_input("gro");
        tokio::time::sleep(Duration::from_millis(300)).await;
        f.input.on_input("groceries");
        settle().await;

        let requests = f.api.note_list_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].search.as_deref(), Some("groceries"));
        assert_eq!(requests[0].page, 1);
        assert!(f.api.search_requests().is_empty());

        // same text again is not a change
        f.input.on_input("groceries");
        settle().await;
        assert_eq!(f.api.note_list_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_page_runs_only_on_trimmed_change() {
        let f = fixture(InputMode::SearchPage);
        f.executor.filter().set_query("budget");

        f.input.on_input("budget  ");
        settle().await;
        assert!(f.api.search_requests().is_empty());

        f.input.on_input("budget q4");
        settle().await;
        let requests = f.api.search_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query.as_deref(), Some("budget q4"));
        assert_eq!(requests[0].page, 1);

        f.input.on_input("");
        settle().await;
        assert_eq!(f.executor.filter().query(), "");
        assert!(f.executor.state().results.items.is_empty());

        f.input.on_input(" ");
        settle().await;
        assert_eq!(f.api.search_requests().len(), 1);
        assert!(f.navigator.routes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_page_write_in_flight_survives_retyping() {
        let f = fixture(InputMode::SearchPage);
        let release = f.api.hold_search(Ok(result_page(&["Q4 budget"], 1, 20, 1)));

        f.input.on_input("budget q4");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(f.executor.state().is_loading);

        f.input.on_input("budget q4 ");
        settle().await;
        release.send(()).unwrap();
        settle().await;

        let state = f.executor.state();
        assert!(!state.is_loading);
        assert_eq!(state.results.items[0].title, "Q4 budget");
        assert_eq!(f.api.search_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_filter_fetch_in_flight_survives_retyping() {
        let f = fixture(InputMode::LiveFilter);
        let release = f.api.hold_notes(Ok(NoteListPage {
            notes: vec![note(4, "Milk run")],
            total: 1,
            page: 1,
            per_page: 10,
            has_next: false,
            has_prev: false,
        }));

        f.input.on_input("milk");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(f.notes.state().is_loading);

        f.input.on_input("milkx");
        f.input.on_input("milk");
        settle().await;
        release.send(()).unwrap();
        settle().await;

        let state = f.notes.state();
        assert!(!state.is_loading);
        assert_eq!(state.listing.notes[0].title, "Milk run");
        assert_eq!(f.api.note_list_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_standalone_types_without_writes() {
        let f = fixture(InputMode::Standalone);

        f.input.on_input("standalone text");
        settle().await;

        assert!(f.api.search_requests().is_empty());
        assert!(f.api.note_list_requests().is_empty());
        assert_eq!(f.executor.filter().query(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_navigates_from_any_mode() {
        for mode in [InputMode::LiveFilter, InputMode::SearchPage, InputMode::Standalone] {
            let f = fixture(mode);

            f.input.on_input("   ");
            assert_eq!(f.input.submit().await, None);

            f.input.on_input(" meeting ");
            let outcome = f.input.submit().await;
            settle().await;

            assert_eq!(outcome, Some(RunOutcome::Applied));
            assert_eq!(f.executor.filter().query(), "meeting");
            assert_eq!(f.api.search_requests().len(), 1, "{:?}", mode);
            assert!(f.api.note_list_requests().is_empty(), "{:?}", mode);
            assert_eq!(f.navigator.routes(), vec![Route::SearchResults]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_clears_before_suggestions() {
        let f = fixture(InputMode::LiveFilter);

        assert_eq!(
            f.input.handle_key(KeyEvent::ctrl(Key::Char('k'))).await,
            KeyHandled::Focused
        );
        f.input.on_input("meet");
        settle().await;
        assert!(f.input.suggestions().state().visible);

        let handled = f.input.handle_key(KeyEvent::plain(Key::Escape)).await;

        assert_eq!(handled, KeyHandled::Cleared);
        assert_eq!(f.input.text(), "");
        assert!(!f.input.is_focused());
        assert!(!f.input.suggestions().state().visible);
        assert_eq!(f.notes.search(), "");

        assert_eq!(
            f.input.handle_key(KeyEvent::plain(Key::Escape)).await,
            KeyHandled::Ignored,
            "unfocused input ignores escape"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_commits_selected_suggestion() {
        let f = fixture(InputMode::LiveFilter);
        f.input.focus();
        f.input.on_input("meet");
        settle().await;

        assert_eq!(
            f.input.handle_key(KeyEvent::plain(Key::ArrowDown)).await,
            KeyHandled::Suggestion(SuggestKey::Moved(Some(0)))
        );
        let handled = f.input.handle_key(KeyEvent::plain(Key::Enter)).await;

        assert_eq!(handled, KeyHandled::Submitted(RunOutcome::Applied));
        assert_eq!(f.input.text(), "meet notes");
        assert_eq!(f.executor.filter().query(), "meet notes");
        assert_eq!(f.navigator.routes(), vec![Route::SearchResults]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_on_search_page_stays_put() {
        let f = fixture(InputMode::SearchPage);

        f.input.commit_suggestion("meeting notes").await;

        assert_eq!(f.api.search_requests().len(), 1);
        assert!(f.navigator.routes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_without_selection_submits() {
        let f = fixture(InputMode::Standalone);
        f.input.focus();
        f.input.on_input("meet");
        settle().await;
        assert!(f.input.suggestions().state().visible);

        let handled = f.input.handle_key(KeyEvent::plain(Key::Enter)).await;

        assert_eq!(handled, KeyHandled::Submitted(RunOutcome::Applied));
        assert_eq!(f.executor.filter().query(), "meet");
        assert_eq!(f.navigator.routes(), vec![Route::SearchResults]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_drops_pending_write() {
        let f = fixture(InputMode::LiveFilter);

        f.input.on_input("draft");
        f.input.set_mode(InputMode::Standalone);
        settle().await;

        assert!(f.api.note_list_requests().is_empty());
    }
}
