//! Dispatch: destination -> country -> provider -> vendor call.

use std::sync::Arc;

use super::{PhoneNumber, PhoneNumberService, ProviderRegistry, SendContent, SendResult};
use crate::config::RoutingConfig;
use crate::error::{Error, Result};
use crate::router::{self, MatchContext};

/// A delivered (or vendor-refused) message and the provider that handled it.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub provider: String,
    pub result: SendResult,
}

/// Routes each message to one provider and makes exactly one vendor call.
///
/// Holds only shared read-only state, so one instance serves all requests
/// concurrently.
#[derive(Clone)]
pub struct SmsService {
    routing: Arc<RoutingConfig>,
    registry: Arc<ProviderRegistry>,
    phone_numbers: Arc<dyn PhoneNumberService>,
}

impl SmsService {
    pub fn new(
        routing: Arc<RoutingConfig>,
        registry: Arc<ProviderRegistry>,
        phone_numbers: Arc<dyn PhoneNumberService>,
    ) -> Self {
        Self {
            routing,
            registry,
            phone_numbers,
        }
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Send `content` to `to` on behalf of `app_id`.
    ///
    /// Vendor failures are not retried; they come back as
    /// [`Error::VendorSend`] with the vendor's payload attached.
    pub async fn send(
        &self,
        app_id: &str,
        to: &PhoneNumber,
        content: &SendContent,
    ) -> Result<DispatchOutcome> {
        let result = self.dispatch(app_id, to, content).await;

        match &result {
            Ok(outcome) => tracing::info!(
                to = %to,
                app_id = %app_id,
                provider = %outcome.provider,
                success = outcome.result.success,
                "SMS dispatched"
            ),
            Err(e @ Error::Integrity(_)) => tracing::error!(
                to = %to,
                app_id = %app_id,
                error = %e,
                "Routing integrity violation"
            ),
            Err(e) => tracing::warn!(
                to = %to,
                app_id = %app_id,
                provider = ?e.provider(),
                error = %e,
                "SMS dispatch failed"
            ),
        }

        result
    }

    async fn dispatch(
        &self,
        app_id: &str,
        to: &PhoneNumber,
        content: &SendContent,
    ) -> Result<DispatchOutcome> {
        let country_code = self.phone_numbers.country_code(to)?;
        let ctx = MatchContext::new(app_id, country_code);

        let provider = router::select(&self.routing.rules, &ctx)?;
        let client = self.registry.get(provider)?;

        tracing::debug!(
            provider = %provider,
            provider_type = %client.provider_type(),
            country_code = %ctx.country_code,
            "Selected provider"
        );

        let result = client
            .send(to, content)
            .await
            .map_err(|e| Error::VendorSend {
                provider: provider.to_string(),
                message: e.to_string(),
                raw_response: e.raw_response().map(str::to_string),
            })?;

        Ok(DispatchOutcome {
            provider: provider.to_string(),
            result,
        })
    }
}
