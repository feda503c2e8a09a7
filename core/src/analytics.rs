use std::sync::Arc;

use tracing::warn;

use crate::api::SearchApi;
use crate::models::{PopularSearch, SearchStats, TrendingSearch};
use crate::state::Shared;

pub const PANEL_LIMIT: u32 = 10;
pub const TRENDING_DAYS: u32 = 7;

/// Informational numbers shown next to the search page. Each section
/// loads on its own; a failed one stays empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsState {
    pub popular: Vec<PopularSearch>,
    pub trending: Vec<TrendingSearch>,
    pub stats: Option<SearchStats>,
    pub is_loading: bool,
}

#[derive(Clone)]
pub struct AnalyticsPanel {
    api: Arc<dyn SearchApi>,
    state: Shared<AnalyticsState>,
}

impl AnalyticsPanel {
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        AnalyticsPanel {
            api,
            state: Shared::default(),
        }
    }

    pub fn state(&self) -> AnalyticsState {
        self.state.get()
    }

    pub async fn load(&self) {
        self.state.update(|s| s.is_loading = true);

        let (popular, trending, stats) = tokio::join!(
            self.api.popular(PANEL_LIMIT),
            self.api.trending(PANEL_LIMIT, TRENDING_DAYS),
            self.api.stats(),
        );

        self.state.update(|s| {
            s.is_loading = false;
            s.popular = popular.unwrap_or_else(|err| {
                warn!(error = %err, "failed to load popular searches");
                Vec::new()
            });
            s.trending = trending.unwrap_or_else(|err| {
                warn!(error = %err, "failed to load trending searches");
                Vec::new()
            });
            s.stats = stats
                .map_err(|err| warn!(error = %err, "failed to load search stats"))
                .ok();
        });
    }
}
