//! Errors surfaced by the persistence and store layers.

use std::io;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store is not configured (set FLAPPY_SUPABASE_URL and FLAPPY_SUPABASE_KEY)")]
    NotConfigured,
    #[error("remote store returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("could not reach remote store: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("local storage failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user {0} already exists")]
    UserExists(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },
    #[error("{0} is already owned")]
    AlreadyOwned(String),
    #[error("unknown item {0}")]
    UnknownItem(String),
    #[error("purchase was rejected by the store")]
    PurchaseRejected,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<ureq::Error> for StoreError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                StoreError::Http {
                    status,
                    message: error_message_from_body(&body),
                }
            }
            ureq::Error::Transport(t) => StoreError::Transport(t.to_string()),
        }
    }
}

/// Pull the human-readable message out of a PostgREST error body.
pub fn error_message_from_body(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            details: Some(details),
            ..
        }) => details,
        Ok(ErrorBody {
            hint: Some(hint), ..
        }) => hint,
        _ if body.trim().is_empty() => "empty response".to_string(),
        _ => body.trim().to_string(),
    }
}
