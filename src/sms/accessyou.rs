//! AccessYou SMS client.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use super::{base_url, read_response, PhoneNumber, SendContent, SendError, SendResult, SmsClient};
use crate::config::{AccessYouConfig, ProviderType};

const DEFAULT_BASE_URL: &str = "http://sms.accessyou-anyip.com";

/// Status AccessYou reports for an accepted message.
const STATUS_ACCEPTED: &str = "100";

static PLUS_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+\-]+").unwrap());

static MSG_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<msg_status>\s*(\d+)\s*</msg_status>").unwrap());

pub struct AccessYouClient {
    http: Client,
    config: AccessYouConfig,
}

impl AccessYouClient {
    pub fn new(http: Client, config: AccessYouConfig) -> Self {
        Self { http, config }
    }
}

/// AccessYou phone numbers carry no `+` or `-`.
fn fix_phone_number(phone: &str) -> String {
    PLUS_HYPHENS.replace_all(phone, "").into_owned()
}

fn parse_status(body: &str) -> Option<&str> {
    MSG_STATUS
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[async_trait]
impl SmsClient for AccessYouClient {
    fn provider_type(&self) -> ProviderType {
        ProviderType::AccessYou
    }

    async fn send(&self, to: &PhoneNumber, content: &SendContent) -> Result<SendResult, SendError> {
        if content.body.is_empty() {
            return Err(SendError::UnsupportedContent(
                "accessyou requires a message body".to_string(),
            ));
        }

        let phone = fix_phone_number(to.expose());
        let query = [
            ("accountno", self.config.accountno.as_str()),
            ("user", self.config.user.as_str()),
            ("pwd", self.config.pwd.expose_secret()),
            ("from", self.config.sender.as_str()),
            ("phone", phone.as_str()),
            ("msg", content.body.as_str()),
        ];

        let url = format!(
            "{}/sendsms.php",
            base_url(&self.config.base_url, DEFAULT_BASE_URL)
        );
        let response = self.http.get(url).query(&query).send().await?;
        let body = read_response(response).await?;

        let status = parse_status(&body).map(str::to_string);
        let success = match status {
            Some(status) => status == STATUS_ACCEPTED,
            None => return Err(SendError::Malformed { body }),
        };

        Ok(SendResult {
            success,
            raw_response: body,
            segment_count: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_phone_number() {
        assert_eq!(fix_phone_number("+852-9123-4567"), "85291234567");
        assert_eq!(fix_phone_number("85291234567"), "85291234567");
    }

    #[test]
    fn test_parse_status() {
        let body = "<xml><msg_status>100</msg_status><msg_id>123</msg_id></xml>";
        assert_eq!(parse_status(body), Some("100"));
        assert_eq!(parse_status("<xml><msg_status> 108 </msg_status></xml>"), Some("108"));
        assert_eq!(parse_status("Internal Server Error"), None);
    }
}
