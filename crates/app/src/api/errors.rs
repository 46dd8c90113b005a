//! Backend errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or a body that could not be decoded.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered `success: false`.
    #[error("request rejected: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    /// Non-2xx status or a body missing the expected data.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// Message to show the shopper: the backend's own words for a rejection,
    /// `fallback` for everything else.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
