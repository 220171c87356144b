//! Nexmo (Vonage) SMS API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{base_url, read_response, PhoneNumber, SendContent, SendError, SendResult, SmsClient};
use crate::config::{NexmoConfig, ProviderType};

const DEFAULT_BASE_URL: &str = "https://rest.nexmo.com";

/// Status value Nexmo uses for an accepted message.
const STATUS_OK: &str = "0";

pub struct NexmoClient {
    http: Client,
    config: NexmoConfig,
}

#[derive(Deserialize)]
struct SmsResponse {
    #[serde(rename = "message-count")]
    message_count: String,
    messages: Vec<MessageStatus>,
}

#[derive(Deserialize)]
struct MessageStatus {
    status: String,
}

impl NexmoClient {
    pub fn new(http: Client, config: NexmoConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl SmsClient for NexmoClient {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Nexmo
    }

    async fn send(&self, to: &PhoneNumber, content: &SendContent) -> Result<SendResult, SendError> {
        if content.body.is_empty() {
            return Err(SendError::UnsupportedContent(
                "nexmo requires a message body".to_string(),
            ));
        }

        // nexmo wants the number without the leading '+'
        let destination = to.expose().trim_start_matches('+');
        let form = [
            ("api_key", self.config.api_key.as_str()),
            ("api_secret", self.config.api_secret.expose_secret()),
            ("from", self.config.sender.as_str()),
            ("to", destination),
            ("text", content.body.as_str()),
        ];

        let url = format!("{}/sms/json", base_url(&self.config.base_url, DEFAULT_BASE_URL));
        let response = self.http.post(url).form(&form).send().await?;
        let body = read_response(response).await?;

        let parsed: SmsResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => return Err(SendError::Malformed { body }),
        };

        let success =
            !parsed.messages.is_empty() && parsed.messages.iter().all(|m| m.status == STATUS_OK);

        Ok(SendResult {
            success,
            segment_count: parsed.message_count.parse().ok(),
            raw_response: body,
        })
    }
}
