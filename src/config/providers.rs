//! Provider definitions and vendor credential blocks.

use serde::{Deserialize, Serialize};

use super::Secret;

/// Vendor kinds the gateway can deliver through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Twilio,
    Nexmo,
    AccessYou,
    SendCloud,
}

impl ProviderType {
    pub const ALL: [ProviderType; 4] = [
        ProviderType::Twilio,
        ProviderType::Nexmo,
        ProviderType::AccessYou,
        ProviderType::SendCloud,
    ];

    /// Name used both as the `type` value and as the vendor block key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Twilio => "twilio",
            ProviderType::Nexmo => "nexmo",
            ProviderType::AccessYou => "accessyou",
            ProviderType::SendCloud => "sendcloud",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured provider: a unique name plus exactly one vendor block.
#[derive(Debug, Clone)]
pub struct ProviderDefinition {
    /// Unique name, referenced by `use_provider` in routing rules
    pub name: String,
    pub vendor: VendorConfig,
}

impl ProviderDefinition {
    pub fn provider_type(&self) -> ProviderType {
        self.vendor.provider_type()
    }
}

/// Vendor-specific configuration. The variant is the provider's type.
#[derive(Debug, Clone)]
pub enum VendorConfig {
    Twilio(TwilioConfig),
    Nexmo(NexmoConfig),
    AccessYou(AccessYouConfig),
    SendCloud(SendCloudConfig),
}

impl VendorConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            VendorConfig::Twilio(_) => ProviderType::Twilio,
            VendorConfig::Nexmo(_) => ProviderType::Nexmo,
            VendorConfig::AccessYou(_) => ProviderType::AccessYou,
            VendorConfig::SendCloud(_) => ProviderType::SendCloud,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub sender: String,
    pub account_sid: String,
    pub auth_token: Secret,
    /// When set, messages go out through the messaging service instead of `sender`
    #[serde(default)]
    pub message_service_sid: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NexmoConfig {
    pub sender: String,
    pub api_key: String,
    pub api_secret: Secret,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessYouConfig {
    pub sender: String,
    pub accountno: String,
    pub user: String,
    pub pwd: Secret,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendCloudConfig {
    pub sms_user: String,
    pub sms_key: Secret,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Template catalog registered with the vendor
    #[serde(default)]
    pub templates: Vec<SendCloudTemplate>,
    #[serde(default)]
    pub template_assignments: Vec<TemplateAssignment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendCloudTemplate {
    pub template_id: String,
    pub template_msg_type: String,
}

/// Maps a gateway template name to vendor template ids.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateAssignment {
    pub template_name: String,
    pub default_template_id: String,
    #[serde(default)]
    pub by_languages: Vec<LanguageTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageTemplate {
    pub language_tag: String,
    pub template_id: String,
}

impl SendCloudConfig {
    pub fn template(&self, template_id: &str) -> Option<&SendCloudTemplate> {
        self.templates.iter().find(|t| t.template_id == template_id)
    }

    /// Pick the catalog template for a template name and optional language tag.
    ///
    /// An exact language match wins; otherwise the assignment's default is used.
    pub fn resolve_template(
        &self,
        template_name: &str,
        language_tag: Option<&str>,
    ) -> Option<&SendCloudTemplate> {
        let assignment = self
            .template_assignments
            .iter()
            .find(|a| a.template_name == template_name)?;

        let template_id = language_tag
            .and_then(|tag| {
                assignment
                    .by_languages
                    .iter()
                    .find(|l| l.language_tag == tag)
            })
            .map(|l| l.template_id.as_str())
            .unwrap_or(assignment.default_template_id.as_str());

        self.template(template_id)
    }
}

/// Provider entry as it appears in the document, one optional block per vendor.
#[derive(Deserialize)]
pub(super) struct RawProvider {
    name: String,
    #[serde(rename = "type")]
    provider_type: ProviderType,
    twilio: Option<TwilioConfig>,
    nexmo: Option<NexmoConfig>,
    accessyou: Option<AccessYouConfig>,
    sendcloud: Option<SendCloudConfig>,
}

impl TryFrom<RawProvider> for ProviderDefinition {
    type Error = String;

    fn try_from(raw: RawProvider) -> Result<Self, Self::Error> {
        let blocks = [
            raw.twilio.is_some(),
            raw.nexmo.is_some(),
            raw.accessyou.is_some(),
            raw.sendcloud.is_some(),
        ];
        if blocks.iter().filter(|present| **present).count() > 1 {
            return Err(format!(
                "provider '{}' must carry only the '{}' block",
                raw.name, raw.provider_type
            ));
        }

        let vendor = match raw.provider_type {
            ProviderType::Twilio => raw.twilio.map(VendorConfig::Twilio),
            ProviderType::Nexmo => raw.nexmo.map(VendorConfig::Nexmo),
            ProviderType::AccessYou => raw.accessyou.map(VendorConfig::AccessYou),
            ProviderType::SendCloud => raw.sendcloud.map(VendorConfig::SendCloud),
        };

        let vendor = vendor.ok_or_else(|| {
            format!(
                "provider '{}' of type '{}' is missing its '{}' block",
                raw.name, raw.provider_type, raw.provider_type
            )
        })?;

        Ok(ProviderDefinition {
            name: raw.name,
            vendor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sendcloud() -> SendCloudConfig {
        serde_json::from_value(serde_json::json!({
            "sms_user": "user",
            "sms_key": "key",
            "templates": [
                { "template_id": "1001", "template_msg_type": "0" },
                { "template_id": "1002", "template_msg_type": "0" }
            ],
            "template_assignments": [{
                "template_name": "verification",
                "default_template_id": "1001",
                "by_languages": [{ "language_tag": "zh-CN", "template_id": "1002" }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_provider_type_names() {
        assert_eq!(ProviderType::from_name("accessyou"), Some(ProviderType::AccessYou));
        assert_eq!(ProviderType::from_name("sendcloud"), Some(ProviderType::SendCloud));
        assert_eq!(ProviderType::from_name("AccessYou"), None);
        for t in ProviderType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_resolve_template_by_language() {
        let config = sendcloud();
        let template = config.resolve_template("verification", Some("zh-CN")).unwrap();
        assert_eq!(template.template_id, "1002");
    }

    #[test]
    fn test_resolve_template_falls_back_to_default() {
        let config = sendcloud();
        assert_eq!(
            config
                .resolve_template("verification", Some("en"))
                .unwrap()
                .template_id,
            "1001"
        );
        assert_eq!(
            config
                .resolve_template("verification", None)
                .unwrap()
                .template_id,
            "1001"
        );
    }

    #[test]
    fn test_resolve_unknown_template_name() {
        assert!(sendcloud().resolve_template("welcome", None).is_none());
    }

    #[test]
    fn test_missing_block_is_rejected() {
        let raw: RawProvider = serde_json::from_value(serde_json::json!({
            "name": "tw",
            "type": "twilio"
        }))
        .unwrap();
        let err = ProviderDefinition::try_from(raw).unwrap_err();
        assert!(err.contains("missing its 'twilio' block"), "{}", err);
    }

    #[test]
    fn test_wrong_block_is_rejected() {
        let raw: RawProvider = serde_json::from_value(serde_json::json!({
            "name": "tw",
            "type": "twilio",
            "nexmo": { "sender": "s", "api_key": "k", "api_secret": "x" }
        }))
        .unwrap();
        assert!(ProviderDefinition::try_from(raw).is_err());
    }
}
