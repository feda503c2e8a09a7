use thiserror::Error;

/// Failure reported by the remote collaborator behind [`crate::SearchApi`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server responded with {status}")]
    Status {
        status: u16,
        /// `detail` field of the error payload, when the server sent one
        detail: Option<String>,
    },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: u16, detail: Option<String>) -> Self {
        ApiError::Status { status, detail }
    }

    /// The collaborator's own explanation, if it gave one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => Some(detail.as_str()),
            _ => None,
        }
    }

    /// Message to show the user: the payload detail, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(|d| d.to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Errors from saved search actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SavedSearchError {
    #[error("Please enter a name for this search")]
    EmptyName,

    #[error("Failed to save search: {0}")]
    SaveFailed(String),

    /// The usage-stats call failed, nothing was applied locally
    #[error("Failed to execute saved search: {0}")]
    ExecuteFailed(String),

    #[error("Failed to delete saved search: {0}")]
    DeleteFailed(String),

    /// A newer execution started while this one waited on the server
    #[error("Saved search execution was superseded")]
    Superseded,
}
