use std::sync::Arc;

use crate::analytics::AnalyticsPanel;
use crate::api::SearchApi;
use crate::config::SearchConfig;
use crate::executor::SearchExecutor;
use crate::filter::{QueryFilter, SharedFilter};
use crate::input::{DualModeSearchInput, InputMode, Navigator};
use crate::notes::NoteListStore;
use crate::saved::SavedSearchManager;
use crate::suggest::SuggestionEngine;

/// Every search component, wired to one filter and one collaborator.
///
/// Views get cheap clones of the handles they need.
#[derive(Clone)]
pub struct SearchSession {
    pub filter: SharedFilter,
    pub executor: SearchExecutor,
    pub suggestions: SuggestionEngine,
    pub saved: SavedSearchManager,
    pub notes: NoteListStore,
    pub analytics: AnalyticsPanel,
    pub input: DualModeSearchInput,
}

impl SearchSession {
    pub fn new(
        api: Arc<dyn SearchApi>,
        config: &SearchConfig,
        navigator: Arc<dyn Navigator>,
        mode: InputMode,
    ) -> Self {
        let filter = SharedFilter::new(QueryFilter {
            per_page: config.per_page.max(1),
            ..QueryFilter::default()
        });
        let executor = SearchExecutor::new(api.clone(), filter.clone());
        let suggestions = SuggestionEngine::new(api.clone(), config);
        let saved = SavedSearchManager::new(api.clone(), executor.clone());
        let notes = NoteListStore::new(api.clone(), config.note_list_per_page);
        let analytics = AnalyticsPanel::new(api);
        let input = DualModeSearchInput::new(
            executor.clone(),
            notes.clone(),
            suggestions.clone(),
            navigator,
            config.live_search_debounce,
            mode,
        );

        SearchSession {
            filter,
            executor,
            suggestions,
            saved,
            notes,
            analytics,
            input,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::filter::FilterChange;
    use crate::input::Route;
    use crate::test::fake_api::FakeApi;
    use crate::test::{settle, RecordingNavigator};

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_to_saved_search_flow() {
        let api = Arc::new(FakeApi::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let config = SearchConfig {
            per_page: 50,
            ..SearchConfig::default()
        };
        let session = SearchSession::new(
            api.clone(),
            &config,
            navigator.clone(),
            InputMode::LiveFilter,
        );

        session.input.focus();
        session.input.on_input("standup");
        settle().await;
        assert_eq!(session.notes.search(), "standup");

        session.input.submit().await;
        session.input.set_mode(InputMode::SearchPage);
        assert_eq!(navigator.routes(), vec![Route::SearchResults]);
        assert_eq!(api.search_requests()[0].per_page, 50);

        session
            .filter
            .set_filter(FilterChange::Tags(vec!["work".to_string()]));
        let saved = session.saved.save("Standups").await.unwrap();

        session.filter.clear();
        session.saved.execute(&saved).await.unwrap();

        let filter = session.filter.snapshot();
        assert_eq!(filter.query, "standup");
        assert!(filter.tags.contains("work"));
        assert_eq!(session.executor.state().highlight_terms.terms(), &["standup"]);
        assert_eq!(session.saved.state().items[0].use_count, 1);
    }
}
