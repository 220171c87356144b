//! Error types for smsgate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::proxy::types::{Code, ResponseBody};

/// Result type alias for smsgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for smsgate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid destination '{number}': {reason}")]
    InvalidDestination { number: String, reason: String },

    /// Routing state contradicts what validation guaranteed.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Provider '{provider}' failed to send: {message}")]
    VendorSend {
        provider: String,
        message: String,
        raw_response: Option<String>,
    },

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl Error {
    /// Response code reported to the caller.
    pub fn code(&self) -> Code {
        match self {
            Error::InvalidDestination { .. } | Error::BadRequest(_) => Code::InvalidRequest,
            Error::VendorSend { .. } => Code::ProviderError,
            Error::Config(_) | Error::Integrity(_) => Code::UnknownError,
        }
    }

    /// Provider that was involved, if the failure happened after selection.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Error::VendorSend { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = code.status_code();
        let body = ResponseBody {
            code,
            error_description: Some(self.to_string()),
            provider: self.provider().map(str::to_string),
            underlying_http_response_body: match self {
                Error::VendorSend { raw_response, .. } => raw_response,
                _ => None,
            },
            segment_count: None,
        };

        (status, axum::Json(body)).into_response()
    }
}
