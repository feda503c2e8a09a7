use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the search layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before suggestions are fetched
    #[serde(with = "millis")]
    pub suggestion_debounce: Duration,
    /// Quiet period before typed text is written into a filter
    #[serde(with = "millis")]
    pub live_search_debounce: Duration,
    pub suggestion_limit: u32,
    /// Shorter trimmed input never asks for suggestions
    pub min_suggestion_len: usize,
    pub per_page: u32,
    pub note_list_per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            suggestion_debounce: Duration::from_millis(300),
            live_search_debounce: Duration::from_millis(500),
            suggestion_limit: 5,
            min_suggestion_len: 2,
            per_page: crate::filter::DEFAULT_PER_PAGE,
            note_list_per_page: 10,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"suggestion_debounce": 150, "per_page": 50}"#).unwrap();

        assert_eq!(config.suggestion_debounce, Duration::from_millis(150));
        assert_eq!(config.per_page, 50);
        assert_eq!(config.live_search_debounce, Duration::from_millis(500));
        assert_eq!(config.min_suggestion_len, 2);
    }
}
