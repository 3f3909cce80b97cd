use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Duplicated,
    ResourceInUse,
    InvalidInput,
    Validation,
    OperationNotAllowed,
    Other,
}

impl ErrorCode {
    /// Classifies a failed response the way the backend's exception handler labels it.
    pub fn classify(status: u16, body: &ApiErrorBody) -> Self {
        match status {
            404 => Self::NotFound,
            409 => {
                let label = body.error.as_deref().unwrap_or_default();
                if label.contains("em Uso") {
                    Self::ResourceInUse
                } else {
                    Self::Duplicated
                }
            }
            400 => {
                if body.validation_errors.is_some() {
                    Self::Validation
                } else {
                    Self::InvalidInput
                }
            }
            403 => Self::OperationNotAllowed,
            _ => Self::Other,
        }
    }
}

/// Error body emitted by the backend's global exception handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Error)]
#[error("{status} {code:?}: {message}")]
pub struct ApiException {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
    pub body: ApiErrorBody,
}

impl ApiException {
    /// `fallback` is used when the body carries no message (e.g. the HTTP reason phrase).
    pub fn from_response(status: u16, body: ApiErrorBody, fallback: impl Into<String>) -> Self {
        let code = ErrorCode::classify(status, &body);
        let message = body
            .message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.into());
        Self {
            status,
            code,
            message,
            body,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.body.suggestion.as_deref()
    }
}
