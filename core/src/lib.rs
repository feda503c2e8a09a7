#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod highlight;
pub mod input;
pub mod keys;
pub mod models;
pub mod notes;
pub mod saved;
pub mod session;
pub mod state;
pub mod suggest;

#[cfg(test)]
mod test;

// Re-export commonly used types
pub use analytics::{AnalyticsPanel, AnalyticsState};
pub use api::{ApiResult, SearchApi};
pub use config::SearchConfig;
pub use error::{ApiError, SavedSearchError};
pub use executor::{RunOutcome, SearchExecutor, SearchState};
pub use filter::{FilterChange, FilterPatch, NoteType, QueryFilter, SharedFilter, TagMode};
pub use highlight::{highlight, highlight_segments, truncate_snippet, HighlightTerms, RichNode};
pub use input::{DualModeSearchInput, InputMode, KeyHandled, Navigator, Route};
pub use keys::{Key, KeyEvent, Modifiers};
pub use models::{
    NewSavedSearch, NoteListPage, NoteListParams, NoteSummary, PopularSearch, ResultItem,
    SavedSearch, SavedSearchListing, SearchRequest, SearchResultSet, SearchStats,
    SuggestionCandidate, TrendDirection, TrendingSearch,
};
pub use notes::{NoteListFilter, NoteListPatch, NoteListState, NoteListStore};
pub use saved::{SavedSearchManager, SavedSearchState};
pub use session::SearchSession;
pub use suggest::{SuggestKey, SuggestionEngine, SuggestionState};
