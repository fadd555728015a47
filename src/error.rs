// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenceError {
    /// Bad caller input: empty or duplicate name lists, bad menu choices.
    #[error("{0}")]
    Input(String),

    /// The API answered with an `error.message` body.
    #[error("API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Malformed report document or listing.
    #[error("malformed document: {0}")]
    Parse(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "matched {matched} of {expected} names, unmatched: {}",
        .unmatched.join(", ")
    )]
    Mismatch {
        matched: usize,
        expected: usize,
        unmatched: Vec<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    Date(String),
}

impl From<quick_xml::Error> for PresenceError {
    fn from(e: quick_xml::Error) -> Self {
        PresenceError::Parse(e.to_string())
    }
}

impl PresenceError {
    /// Retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PresenceError::Network(_) => true,
            PresenceError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PresenceError>;
