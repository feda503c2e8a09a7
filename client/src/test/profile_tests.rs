use std::time::Duration;

use jot_search_core::SearchConfig;

use super::test_context::TestContext;
use crate::app_config::{AppConfig, EnvOverrides, DEFAULT_API_URL};
use crate::profile::{
    current_profile_name_in, list_profiles_in, set_current_profile_name_in, Profile,
    DEFAULT_PROFILE,
};

#[test]
fn test_profile_round_trip() {
    let ctx = TestContext::new();
    let profile = Profile {
        api_url: Some("https://notes.example.com/api".to_string()),
        token: Some("abc".to_string()),
        search: SearchConfig {
            suggestion_debounce: Duration::from_millis(150),
            per_page: 50,
            ..SearchConfig::default()
        },
    };

    let path = ctx.write_profile("work", &profile);

    assert_eq!(Profile::from_path(&path).unwrap(), Some(profile));
}

#[test]
fn test_missing_profile_is_none() {
    let ctx = TestContext::new();
    assert_eq!(Profile::from_path(&ctx.profile_path("nope")).unwrap(), None);
}

#[test]
fn test_partial_profile_fills_defaults() {
    let ctx = TestContext::new();
    let path = ctx.write_raw(
        "partial",
        r#"
api_url = "http://search.local/api"

[search]
live_search_debounce = 800
"#,
    );

    let profile = Profile::from_path(&path).unwrap().unwrap();

    assert_eq!(profile.token, None);
    assert_eq!(profile.search.live_search_debounce, Duration::from_millis(800));
    assert_eq!(profile.search.suggestion_limit, 5);
}

#[test]
fn test_invalid_profile_is_an_error() {
    let ctx = TestContext::new();
    let path = ctx.write_raw("broken", "api_url = [not toml");

    let err = Profile::from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to deserialize profile"));
}

#[test]
fn test_current_profile_marker() {
    let ctx = TestContext::new();
    assert_eq!(current_profile_name_in(&ctx.config_dir).unwrap(), DEFAULT_PROFILE);

    set_current_profile_name_in(&ctx.config_dir, "work").unwrap();
    assert_eq!(current_profile_name_in(&ctx.config_dir).unwrap(), "work");
}

#[test]
fn test_list_profiles_includes_default() {
    let ctx = TestContext::new();
    assert_eq!(list_profiles_in(&ctx.config_dir).unwrap(), vec![DEFAULT_PROFILE]);

    ctx.write_profile("work", &Profile::default());
    ctx.write_profile("alpha", &Profile::default());
    std::fs::write(ctx.config_dir.join("profiles").join("notes.txt"), "skip").unwrap();

    assert_eq!(
        list_profiles_in(&ctx.config_dir).unwrap(),
        vec!["alpha", DEFAULT_PROFILE, "work"]
    );
}

#[test]
fn test_app_config_precedence() {
    let ctx = TestContext::new();
    let path = ctx.profile_path("work");
    let profile = Profile {
        api_url: Some("http://profile.local/api/".to_string()),
        token: Some("profile-token".to_string()),
        search: SearchConfig {
            per_page: 30,
            ..SearchConfig::default()
        },
    };

    let config = AppConfig::from_parts(&path, Some(&profile), &EnvOverrides::default());
    assert!(config.profile_exists);
    assert_eq!(config.api_url, "http://profile.local/api");
    assert_eq!(config.token.as_deref(), Some("profile-token"));
    assert_eq!(config.search.per_page, 30);

    let overrides = EnvOverrides {
        api_url: Some("http://env.local/api".to_string()),
        token: Some("env-token".to_string()),
        ..EnvOverrides::default()
    };
    let config = AppConfig::from_parts(&path, Some(&profile), &overrides);
    assert_eq!(config.api_url, "http://env.local/api");
    assert_eq!(config.token.as_deref(), Some("env-token"));

    let config = AppConfig::from_parts(&path, None, &EnvOverrides::default());
    assert!(!config.profile_exists);
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.token, None);
    assert_eq!(config.search, SearchConfig::default());
}

#[test]
fn test_app_config_hides_token() {
    let config = AppConfig {
        token: Some("very-secret".to_string()),
        ..AppConfig::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("very-secret"));
    assert!(json.contains(r#""api_url":"http://localhost:8000/api""#));
}
