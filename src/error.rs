use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Payout provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures reported by the payout provider or the transport in front of it.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Provider returned {status}: {name} - {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
        debug_id: Option<String>,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PayoutError>;
