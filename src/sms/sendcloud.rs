//! SendCloud template SMS client.
//!
//! SendCloud only delivers pre-registered templates. The gateway template
//! name and language tag pick a catalog entry through the provider's
//! template assignments; request variables are passed through as `vars`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{base_url, read_response, PhoneNumber, SendContent, SendError, SendResult, SmsClient};
use crate::config::{ProviderType, SendCloudConfig};

const DEFAULT_BASE_URL: &str = "https://api.sendcloud.net";

pub struct SendCloudClient {
    http: Client,
    config: SendCloudConfig,
}

#[derive(Deserialize)]
struct SendResponse {
    result: bool,
}

impl SendCloudClient {
    pub fn new(http: Client, config: SendCloudConfig) -> Self {
        Self { http, config }
    }
}

/// Hex SHA-256 over `key&k1=v1&k2=v2...&key`, parameters in key order.
fn sign(params: &BTreeMap<&str, String>, key: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let digest = Sha256::digest(format!("{}&{}&{}", key, joined, key).as_bytes());
    format!("{:x}", digest)
}

#[async_trait]
impl SmsClient for SendCloudClient {
    fn provider_type(&self) -> ProviderType {
        ProviderType::SendCloud
    }

    async fn send(&self, to: &PhoneNumber, content: &SendContent) -> Result<SendResult, SendError> {
        let template = content.template.as_ref().ok_or_else(|| {
            SendError::UnsupportedContent("sendcloud requires a template_name".to_string())
        })?;

        let resolved = self
            .config
            .resolve_template(&template.name, template.language_tag.as_deref())
            .ok_or_else(|| {
                SendError::UnsupportedContent(format!(
                    "no sendcloud template assigned to '{}'",
                    template.name
                ))
            })?;

        let mut params = BTreeMap::new();
        params.insert("smsUser", self.config.sms_user.clone());
        params.insert("templateId", resolved.template_id.clone());
        params.insert("msgType", resolved.template_msg_type.clone());
        params.insert("phone", to.expose().trim_start_matches('+').to_string());
        params.insert(
            "vars",
            serde_json::Value::Object(template.variables.clone()).to_string(),
        );
        let signature = sign(&params, self.config.sms_key.expose_secret());
        params.insert("signature", signature);

        let url = format!(
            "{}/smsapi/send",
            base_url(&self.config.base_url, DEFAULT_BASE_URL)
        );
        let response = self.http.post(url).form(&params).send().await?;
        let body = read_response(response).await?;

        let parsed: SendResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => return Err(SendError::Malformed { body }),
        };

        Ok(SendResult {
            success: parsed.result,
            raw_response: body,
            segment_count: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("templateId", "1".to_string());
        a.insert("phone", "85291234567".to_string());

        let mut b = BTreeMap::new();
        b.insert("phone", "85291234567".to_string());
        b.insert("templateId", "1".to_string());

        assert_eq!(sign(&a, "key"), sign(&b, "key"));
        assert_eq!(sign(&a, "key").len(), 64);
        assert_ne!(sign(&a, "key"), sign(&a, "other-key"));
    }
}
