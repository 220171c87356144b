//! Provider selection logic.

use crate::config::RoutingRule;
use crate::error::{Error, Result};

/// Per-request facts evaluated against routing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub app_id: String,
    /// ISO 3166-1 alpha-2 code of the destination number
    pub country_code: String,
}

impl MatchContext {
    pub fn new(app_id: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            country_code: country_code.into(),
        }
    }
}

impl RoutingRule {
    /// Whether this rule's predicate holds for `ctx`. Default rules have no
    /// predicate and never match here.
    pub fn matches(&self, ctx: &MatchContext) -> bool {
        match self {
            RoutingRule::MatchCountry { country_code, .. } => *country_code == ctx.country_code,
            RoutingRule::MatchAppAndCountry {
                app_id,
                country_code,
                ..
            } => *app_id == ctx.app_id && *country_code == ctx.country_code,
            RoutingRule::Default { .. } => false,
        }
    }
}

/// Choose the provider name for a request.
///
/// Rules are scanned in order and the first matching non-default rule wins.
/// A `default` rule only records a fallback and the scan continues, so a
/// default may sit anywhere in the list; when several are present the last
/// one wins. With no match and no default the configuration is broken, which
/// is reported as [`Error::Integrity`].
pub fn select<'a>(rules: &'a [RoutingRule], ctx: &MatchContext) -> Result<&'a str> {
    let mut fallback = None;

    for rule in rules {
        if rule.is_default() {
            fallback = Some(rule.use_provider());
            continue;
        }
        if rule.matches(ctx) {
            tracing::debug!(rule = %rule, "Matched routing rule");
            return Ok(rule.use_provider());
        }
    }

    match fallback {
        Some(provider) => {
            tracing::debug!(provider = %provider, "No rule matched, using default");
            Ok(provider)
        }
        None => Err(Error::Integrity(format!(
            "cannot select provider for app '{}' and country '{}': no default rule",
            ctx.app_id, ctx.country_code
        ))),
    }
}
