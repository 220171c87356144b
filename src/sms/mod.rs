//! SMS delivery: vendor clients, the provider registry, and the dispatch
//! service that ties routing to delivery.

pub mod accessyou;
pub mod nexmo;
pub mod phone;
mod registry;
pub mod sendcloud;
mod service;
pub mod twilio;

pub use phone::{LibPhoneNumber, PhoneNumber, PhoneNumberService};
pub use registry::ProviderRegistry;
pub use service::{DispatchOutcome, SmsService};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ProviderType;

/// What to deliver: a plain body, a vendor template, or both.
#[derive(Debug, Clone, Default)]
pub struct SendContent {
    pub body: String,
    pub template: Option<TemplateContent>,
}

impl SendContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            template: None,
        }
    }
}

/// Template reference for vendors that only deliver pre-registered templates.
#[derive(Debug, Clone)]
pub struct TemplateContent {
    pub name: String,
    pub language_tag: Option<String>,
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Normalized result of a vendor call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    /// Whether the vendor acknowledged the message
    pub success: bool,
    /// Vendor response body, kept for diagnostics
    pub raw_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
}

/// Failure talking to a vendor.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Rejected { status: u16, body: String },

    #[error("unexpected provider response")]
    Malformed { body: String },

    #[error("{0}")]
    UnsupportedContent(String),
}

impl SendError {
    /// Vendor payload attached to the failure, when one was received.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            SendError::Rejected { body, .. } | SendError::Malformed { body } => Some(body),
            SendError::Transport(_) | SendError::UnsupportedContent(_) => None,
        }
    }
}

/// A live client for one configured provider.
#[async_trait]
pub trait SmsClient: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    async fn send(&self, to: &PhoneNumber, content: &SendContent) -> Result<SendResult, SendError>;
}

/// Read a vendor response, turning non-2xx statuses into [`SendError::Rejected`].
pub(crate) async fn read_response(response: reqwest::Response) -> Result<String, SendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::warn!(status = %status, body = %body, "Provider rejected request");
        return Err(SendError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub(crate) fn base_url<'a>(configured: &'a Option<String>, default: &'a str) -> &'a str {
    configured
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_only_when_payload_received() {
        let rejected = SendError::Rejected {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(rejected.raw_response(), Some("unauthorized"));

        let unsupported = SendError::UnsupportedContent("needs a template".to_string());
        assert_eq!(unsupported.raw_response(), None);
    }

    #[test]
    fn test_base_url_default_and_trailing_slash() {
        assert_eq!(base_url(&None, "https://api.example.com"), "https://api.example.com");
        assert_eq!(
            base_url(&Some("http://localhost:9000/".to_string()), "https://api.example.com"),
            "http://localhost:9000"
        );
        assert_eq!(
            base_url(&Some(String::new()), "https://api.example.com"),
            "https://api.example.com"
        );
    }
}
