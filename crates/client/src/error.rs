//! Client error taxonomy.
//!
//! Every failure a caller can observe is a [`ClientError`]. Use
//! [`ClientError::user_message`] to get the text shown to an operator.
//! Server payloads of any shape are classified without assuming a nested
//! field exists.

use musicly_core::error::CoreError;
use musicly_core::error_codes::{self, GENERIC_MESSAGE};
use serde_json::Value;

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Client-side validation or domain rule, raised before any request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("Catalog API error ({status}){}", .code.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    Server {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    /// 2xx response whose envelope reports failure.
    #[error("Request rejected{}", .code.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    Rejected {
        code: Option<String>,
        message: Option<String>,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The configured base URL cannot carry endpoint paths.
    #[error("Invalid API base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to read {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Build an error from a non-2xx status and its raw body.
    ///
    /// The code is the envelope's `data` field when it is a string, else a
    /// top-level `code`. Bodies that are not JSON carry no code.
    pub fn from_error_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let (code, message) = match parsed.as_ref() {
            Some(value) => (extract_code(value), extract_message(value)),
            None => (None, None),
        };
        ClientError::Server {
            status,
            code,
            message,
        }
    }

    /// Machine-readable server code, if one was reported.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Server { code, .. } | ClientError::Rejected { code, .. } => {
                code.as_deref()
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
            || matches!(self, ClientError::Core(CoreError::Unauthorized(_)))
    }

    /// Text to show the operator.
    ///
    /// Validation and domain messages pass through. Server codes go through
    /// the translation table. Transport and decode failures, and anything
    /// unrecognised, use the generic message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Core(CoreError::Validation(msg))
            | ClientError::Core(CoreError::Conflict(msg))
            | ClientError::Core(CoreError::Unauthorized(msg)) => msg.clone(),
            ClientError::Core(CoreError::NotFound { .. }) => "Not Found".to_string(),
            ClientError::Core(CoreError::Internal(_)) => GENERIC_MESSAGE.to_string(),
            ClientError::Server { code, .. } => code
                .as_deref()
                .map(error_codes::translate)
                .unwrap_or(GENERIC_MESSAGE)
                .to_string(),
            ClientError::Rejected { code, message } => code
                .as_deref()
                .and_then(error_codes::lookup)
                .map(str::to_string)
                .or_else(|| message.clone().filter(|m| !m.trim().is_empty()))
                .unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            ClientError::Attachment { path, .. } => format!("Could not read file {path}"),
            ClientError::Transport(_)
            | ClientError::Decode(_)
            | ClientError::BaseUrl { .. }
            | ClientError::Storage(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

fn extract_code(value: &Value) -> Option<String> {
    let code = value
        .get("data")
        .and_then(Value::as_str)
        .or_else(|| value.get("code").and_then(Value::as_str))?;
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn extract_message(value: &Value) -> Option<String> {
    ["Message", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
