#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use jot_search_core::{InputMode, Navigator, SearchSession};

pub mod app_config;
pub mod logging;
pub mod profile;
pub mod web_client;

#[cfg(test)]
mod test;

pub use app_config::AppConfig;
pub use web_client::WebClient;

/// Build a search session against the API the active profile points at.
pub fn connect(
    config: &AppConfig,
    navigator: Arc<dyn Navigator>,
    mode: InputMode,
) -> anyhow::Result<SearchSession> {
    let api = WebClient::from_config(config)?;
    tracing::info!(api_url = %config.api_url, "search session ready");
    Ok(SearchSession::new(
        Arc::new(api),
        &config.search,
        navigator,
        mode,
    ))
}
