//! Twilio Programmable Messaging client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{base_url, read_response, PhoneNumber, SendContent, SendError, SendResult, SmsClient};
use crate::config::{ProviderType, TwilioConfig};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

pub struct TwilioClient {
    http: Client,
    config: TwilioConfig,
}

#[derive(Deserialize)]
struct MessageResource {
    num_segments: Option<String>,
}

impl TwilioClient {
    pub fn new(http: Client, config: TwilioConfig) -> Self {
        Self { http, config }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            base_url(&self.config.base_url, DEFAULT_BASE_URL),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsClient for TwilioClient {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Twilio
    }

    async fn send(&self, to: &PhoneNumber, content: &SendContent) -> Result<SendResult, SendError> {
        if content.body.is_empty() {
            return Err(SendError::UnsupportedContent(
                "twilio requires a message body".to_string(),
            ));
        }

        let mut form = vec![("To", to.expose()), ("Body", content.body.as_str())];
        match self.config.message_service_sid.as_deref() {
            Some(sid) if !sid.is_empty() => form.push(("MessagingServiceSid", sid)),
            _ => form.push(("From", self.config.sender.as_str())),
        }

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await?;

        let body = read_response(response).await?;
        let segment_count = serde_json::from_str::<MessageResource>(&body)
            .ok()
            .and_then(|m| m.num_segments)
            .and_then(|n| n.parse().ok());

        Ok(SendResult {
            success: true,
            raw_response: body,
            segment_count,
        })
    }
}
