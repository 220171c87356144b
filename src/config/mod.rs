//! Configuration parsing and validation for smsgate.
//!
//! The process reads a single TOML file. `[server]` and `[logging]` are
//! decoded directly; the routing part (`[[providers]]` and `[[rules]]`) goes
//! through three stages:
//!
//! 1. structural schema check over the raw document ([`schema`])
//! 2. decoding into the typed model ([`ProviderDefinition`], [`RoutingRule`])
//! 3. cross-reference checks over the typed model ([`RoutingConfig::validate`])
//!
//! Every stage reports all problems it finds, not only the first one.

mod providers;
mod rules;
mod schema;
mod validate;

pub use providers::{
    AccessYouConfig, LanguageTemplate, NexmoConfig, ProviderDefinition, ProviderType,
    SendCloudConfig, SendCloudTemplate, TemplateAssignment, TwilioConfig, VendorConfig,
};
pub use rules::RoutingRule;
pub use validate::{FieldError, ValidationErrors};

use providers::RawProvider;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub routing: RoutingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8091")
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Timeout applied to every outbound vendor request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen() -> String {
    "127.0.0.1:8091".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level, used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Credential wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
///
/// Only accessible via `.expose_secret()`, so every use is grep-auditable.
#[derive(Clone)]
pub struct Secret(SecretString);

impl Secret {
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Secret(SecretString::from(s)))
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Secret(SecretString::from(s))
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Secret(SecretString::from(s.to_string()))
    }
}

/// Provider definitions plus the ordered routing rules.
///
/// Built once at startup and shared read-only afterwards. A new
/// configuration means building a new value, never editing this one.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub providers: Vec<ProviderDefinition>,
    pub rules: Vec<RoutingRule>,
}

#[derive(Deserialize)]
struct RawRoutingConfig {
    providers: Vec<RawProvider>,
    rules: Vec<RoutingRule>,
}

impl RoutingConfig {
    /// Validate a routing document and decode it, expanding `${VAR}`
    /// references in vendor blocks from the process environment.
    pub fn from_value(doc: Value) -> Result<Self, ConfigError> {
        Self::from_value_with(doc, |name| std::env::var(name).ok())
    }

    fn from_value_with<F>(mut doc: Value, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        schema::check(&doc).map_err(ConfigError::Schema)?;
        expand_provider_blocks(&mut doc, &lookup)?;

        let raw: RawRoutingConfig = serde_json::from_value(doc).map_err(ConfigError::Decode)?;

        let mut providers = Vec::with_capacity(raw.providers.len());
        let mut errors = ValidationErrors::default();
        for (i, provider) in raw.providers.into_iter().enumerate() {
            match ProviderDefinition::try_from(provider) {
                Ok(p) => providers.push(p),
                Err(message) => errors.push(format!("/providers/{}", i), message),
            }
        }
        errors.into_result().map_err(ConfigError::Schema)?;

        let config = RoutingConfig {
            providers,
            rules: raw.rules,
        };
        config.validate().map_err(ConfigError::Validation)?;

        Ok(config)
    }

    /// Look up a provider definition by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderDefinition> {
        self.providers.iter().find(|p| p.name == name)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::parse_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(content).map_err(ConfigError::Parse)?;

        let server: ServerConfig = match table.remove("server") {
            Some(value) => value.try_into().map_err(ConfigError::Parse)?,
            None => ServerConfig::default(),
        };
        let logging: LoggingConfig = match table.remove("logging") {
            Some(value) => value.try_into().map_err(ConfigError::Parse)?,
            None => LoggingConfig::default(),
        };

        let doc = serde_json::to_value(&table).map_err(ConfigError::Decode)?;
        let routing = RoutingConfig::from_value(doc)?;

        Ok(Config {
            server,
            logging,
            routing,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Environment variable '{var}' not set for provider '{provider}': {message}")]
    EnvVar {
        var: String,
        provider: String,
        message: String,
    },

    #[error("Configuration does not match schema:\n{0}")]
    Schema(ValidationErrors),

    #[error("Configuration validation error:\n{0}")]
    Validation(ValidationErrors),
}

impl ConfigError {
    /// Field-level violations, when the error carries any.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            ConfigError::Schema(errors) | ConfigError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Expand `${VAR}` references in every string value of every vendor block.
fn expand_provider_blocks<F>(doc: &mut Value, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(providers) = doc.get_mut("providers").and_then(Value::as_array_mut) else {
        return Ok(());
    };

    for provider in providers {
        let Some(fields) = provider.as_object_mut() else {
            continue;
        };
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for provider_type in ProviderType::ALL {
            if let Some(block) = fields.get_mut(provider_type.as_str()) {
                expand_strings(block, &name, lookup)?;
            }
        }
    }

    Ok(())
}

fn expand_strings<F>(value: &mut Value, provider_name: &str, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = expand_env_vars_with(s, provider_name, lookup)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                expand_strings(item, provider_name, lookup)?;
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                expand_strings(field, provider_name, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Supports multiple `${VAR}` in one string (e.g., `${SCHEME}://${HOST}`).
/// Fails on first missing variable, unclosed `${`, or empty variable name.
fn expand_env_vars_with<F>(
    input: &str,
    provider_name: &str,
    lookup: F,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            provider: provider_name.to_string(),
            message: "Unclosed '${' in config value".to_string(),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                provider: provider_name.to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            provider: provider_name.to_string(),
            message: format!(
                "Environment variable '{}' is not set (referenced in provider '{}')",
                var_name, provider_name
            ),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}
