use std::path::Path;

use jot_search_core::SearchConfig;
use serde::Serialize;

use crate::profile::{get_profile_path, Profile, DEFAULT_PROFILE};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub const PROFILE_ENV: &str = "JOT_SEARCH_PROFILE";
pub const API_URL_ENV: &str = "JOT_SEARCH_API_URL";
pub const TOKEN_ENV: &str = "JOT_SEARCH_TOKEN";

/// Values taken from the environment, winning over the profile.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvOverrides {
    pub profile: Option<String>,
    pub api_url: Option<String>,
    pub token: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EnvOverrides {
    /// Read the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        EnvOverrides {
            profile: non_blank(std::env::var(PROFILE_ENV).ok()),
            api_url: non_blank(std::env::var(API_URL_ENV).ok()),
            token: non_blank(std::env::var(TOKEN_ENV).ok()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub profile_path: String,
    pub profile_exists: bool,
    pub api_url: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub search: SearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            profile_path: format!("./{}.toml", DEFAULT_PROFILE),
            profile_exists: false,
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the active profile and merge it with the environment.
    pub fn load() -> anyhow::Result<Self> {
        let overrides = EnvOverrides::from_env();
        let profile_path = get_profile_path(overrides.profile.as_deref());
        let profile = Profile::from_path(&profile_path)?;

        Ok(AppConfig::from_parts(
            &profile_path,
            profile.as_ref(),
            &overrides,
        ))
    }

    pub fn from_parts(
        profile_path: &Path,
        profile: Option<&Profile>,
        overrides: &EnvOverrides,
    ) -> Self {
        let defaults = AppConfig::default();

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| non_blank(profile.and_then(|p| p.api_url.clone())))
            .unwrap_or(defaults.api_url);

        AppConfig {
            profile_exists: profile.is_some(),
            profile_path: profile_path
                .to_str()
                .map(|p| p.to_string())
                .unwrap_or(defaults.profile_path),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: overrides
                .token
                .clone()
                .or_else(|| non_blank(profile.and_then(|p| p.token.clone()))),
            search: profile.map(|p| p.search.clone()).unwrap_or(defaults.search),
        }
    }
}
