use std::collections::BTreeMap;

use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

/// Field name -> human readable message, as rendered next to form inputs.
pub type FieldErrors = BTreeMap<String, String>;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(FieldErrors),
    #[error("{0}")]
    Lookup(String),
    #[error("event stream failed: {0}")]
    Stream(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api(err) => Some(err.code),
            _ => None,
        }
    }

    /// Text for the page-level error banner: the backend message when one was sent,
    /// otherwise the generic error text.
    pub fn display_message(&self) -> String {
        match self {
            Self::Api(err) => err.message.clone(),
            Self::Lookup(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

fn join_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
