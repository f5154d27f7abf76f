use geomind_core::NetworkError;
use thiserror::Error;

/// Message used when the provider gives us nothing better.
pub const GENERIC_FAILURE: &str = "Failed to connect to Gemini.";

/// Any failure of a chat request. Never retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The provider answered with an error payload or status.
    #[error("Gemini API error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key")]
    MissingApiKey,
}

impl ServiceError {
    /// The provider's own message when there is one, otherwise a generic fallback.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Provider { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}
