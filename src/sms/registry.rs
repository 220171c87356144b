//! Provider name to live client mapping.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

use super::accessyou::AccessYouClient;
use super::nexmo::NexmoClient;
use super::sendcloud::SendCloudClient;
use super::twilio::TwilioClient;
use super::SmsClient;
use crate::config::{RoutingConfig, VendorConfig};
use crate::error::{Error, Result};

/// One client per configured provider, keyed by provider name.
///
/// Built once at startup and never modified afterwards.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    clients: HashMap<String, Arc<dyn SmsClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every provider in the configuration, all sharing
    /// one HTTP connection pool.
    pub fn from_config(config: &RoutingConfig, http_client: Client) -> Self {
        let mut registry = Self::new();
        for provider in &config.providers {
            let client: Arc<dyn SmsClient> = match &provider.vendor {
                VendorConfig::Twilio(c) => Arc::new(TwilioClient::new(http_client.clone(), c.clone())),
                VendorConfig::Nexmo(c) => Arc::new(NexmoClient::new(http_client.clone(), c.clone())),
                VendorConfig::AccessYou(c) => {
                    Arc::new(AccessYouClient::new(http_client.clone(), c.clone()))
                }
                VendorConfig::SendCloud(c) => {
                    Arc::new(SendCloudClient::new(http_client.clone(), c.clone()))
                }
            };
            tracing::debug!(provider = %provider.name, provider_type = %provider.provider_type(), "Registered provider client");
            registry.insert(provider.name.clone(), client);
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, client: Arc<dyn SmsClient>) {
        self.clients.insert(name.into(), client);
    }

    /// Client registered under `name`.
    ///
    /// Validation guarantees every selectable name is registered, so a miss
    /// is an [`Error::Integrity`] rather than a request error.
    pub fn get(&self, name: &str) -> Result<Arc<dyn SmsClient>> {
        self.clients
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Integrity(format!("provider '{}' is not registered", name)))
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
