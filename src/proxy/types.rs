//! Request and response bodies of the gateway API.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::sms::{DispatchOutcome, PhoneNumber, SendContent, TemplateContent};

/// Body of `POST /send`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub app_id: String,
    pub to: PhoneNumber,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub language_tag: Option<String>,
    #[serde(default)]
    pub template_variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl SendRequest {
    /// What to deliver. A template reference is attached only when a
    /// template name was given.
    pub fn content(&self) -> SendContent {
        let template = self
            .template_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .map(|name| TemplateContent {
                name: name.clone(),
                language_tag: self.language_tag.clone().filter(|tag| !tag.is_empty()),
                variables: self.template_variables.clone().unwrap_or_default(),
            });

        SendContent {
            body: self.body.clone(),
            template,
        }
    }
}

/// Normalized outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// Provider accepted the message
    Ok,
    /// Request malformed or destination unusable
    InvalidRequest,
    /// Provider failed or refused the message
    ProviderError,
    /// Anything else, including routing integrity violations
    UnknownError,
}

impl Code {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Code::Ok => StatusCode::OK,
            Code::InvalidRequest => StatusCode::BAD_REQUEST,
            Code::ProviderError => StatusCode::BAD_GATEWAY,
            Code::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every `POST /send` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBody {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Provider that handled the message, when one was selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_http_response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
}

impl From<DispatchOutcome> for ResponseBody {
    fn from(outcome: DispatchOutcome) -> Self {
        let accepted = outcome.result.success;
        Self {
            code: if accepted { Code::Ok } else { Code::ProviderError },
            error_description: (!accepted).then(|| {
                format!("provider '{}' did not accept the message", outcome.provider)
            }),
            provider: Some(outcome.provider),
            underlying_http_response_body: Some(outcome.result.raw_response),
            segment_count: outcome.result.segment_count,
        }
    }
}
