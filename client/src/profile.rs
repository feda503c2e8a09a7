use std::path::{Path, PathBuf};

use anyhow::{Context, Ok};
use jot_search_core::SearchConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Base of the search API, e.g. `http://localhost:8000/api`
    pub api_url: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Profile {
    pub fn from_path(profile: &Path) -> anyhow::Result<Option<Self>> {
        if !profile.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(profile).context("Failed to read profile file")?;

        let profile: Self = toml::from_str(&contents).context("Failed to deserialize profile")?;

        Ok(Some(profile))
    }

    pub fn save(&self, profile_path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string(self).context("Failed to serialize profile")?;

        if let Some(parent) = profile_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create profile directory")?;
        }
        std::fs::write(profile_path, content).context("Failed to write profile")?;

        Ok(())
    }
}

/// Get the XDG config directory, respecting XDG_CONFIG_HOME
pub fn get_config_dir() -> PathBuf {
    if let std::result::Result::Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("jot-search")
    } else {
        directories::ProjectDirs::from("com", "beardo", "jot-search")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Name stored in the "current" marker under `config_dir`, or the default.
pub fn current_profile_name_in(config_dir: &Path) -> anyhow::Result<String> {
    let current_file = config_dir.join("current");

    if current_file.exists() {
        let name =
            std::fs::read_to_string(&current_file).context("Failed to read current profile")?;
        let name = name.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
    Ok(DEFAULT_PROFILE.to_string())
}

pub fn set_current_profile_name_in(config_dir: &Path, name: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    std::fs::write(config_dir.join("current"), name).context("Failed to write current profile")?;
    Ok(())
}

pub fn get_current_profile_name() -> anyhow::Result<String> {
    current_profile_name_in(&get_config_dir())
}

pub fn set_current_profile_name(name: &str) -> anyhow::Result<()> {
    set_current_profile_name_in(&get_config_dir(), name)
}

pub fn profile_config_path_in(config_dir: &Path, profile_name: &str) -> PathBuf {
    config_dir
        .join("profiles")
        .join(format!("{}.toml", profile_name))
}

/// Get path to a profile's config file
pub fn get_profile_config_path(profile_name: &str) -> PathBuf {
    profile_config_path_in(&get_config_dir(), profile_name)
}

/// All profiles under `config_dir`, always including the default one.
pub fn list_profiles_in(config_dir: &Path) -> anyhow::Result<Vec<String>> {
    let profiles_dir = config_dir.join("profiles");
    let mut profiles = vec![];

    if profiles_dir.exists() {
        for entry in
            std::fs::read_dir(&profiles_dir).context("Failed to read profiles directory")?
        {
            let path = entry?.path();

            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml") {
                if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                    profiles.push(name.to_string());
                }
            }
        }
    }

    if !profiles.iter().any(|p| p == DEFAULT_PROFILE) {
        profiles.push(DEFAULT_PROFILE.to_string());
    }

    profiles.sort();
    Ok(profiles)
}

pub fn list_profiles() -> anyhow::Result<Vec<String>> {
    list_profiles_in(&get_config_dir())
}

/// Path of the named profile, else of the current one.
pub fn get_profile_path(profile_name: Option<&str>) -> PathBuf {
    match profile_name {
        Some(name) => get_profile_config_path(name),
        None => {
            let current = get_current_profile_name().unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
            get_profile_config_path(&current)
        }
    }
}
