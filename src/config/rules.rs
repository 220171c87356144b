//! Routing rules.

use serde::{Deserialize, Serialize};

/// A single routing rule. List order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingRule {
    /// Matches when the destination's country code equals `country_code`.
    MatchCountry {
        country_code: String,
        use_provider: String,
    },
    /// Matches when both the calling app and the destination country match.
    MatchAppAndCountry {
        app_id: String,
        country_code: String,
        use_provider: String,
    },
    /// Fallback used when no other rule matches.
    Default { use_provider: String },
}

impl RoutingRule {
    pub const KINDS: [&'static str; 3] = ["match_country", "match_app_and_country", "default"];

    pub fn match_country(country_code: impl Into<String>, use_provider: impl Into<String>) -> Self {
        RoutingRule::MatchCountry {
            country_code: country_code.into(),
            use_provider: use_provider.into(),
        }
    }

    pub fn match_app_and_country(
        app_id: impl Into<String>,
        country_code: impl Into<String>,
        use_provider: impl Into<String>,
    ) -> Self {
        RoutingRule::MatchAppAndCountry {
            app_id: app_id.into(),
            country_code: country_code.into(),
            use_provider: use_provider.into(),
        }
    }

    pub fn default_to(use_provider: impl Into<String>) -> Self {
        RoutingRule::Default {
            use_provider: use_provider.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RoutingRule::MatchCountry { .. } => "match_country",
            RoutingRule::MatchAppAndCountry { .. } => "match_app_and_country",
            RoutingRule::Default { .. } => "default",
        }
    }

    /// Name of the provider this rule selects.
    pub fn use_provider(&self) -> &str {
        match self {
            RoutingRule::MatchCountry { use_provider, .. }
            | RoutingRule::MatchAppAndCountry { use_provider, .. }
            | RoutingRule::Default { use_provider } => use_provider,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, RoutingRule::Default { .. })
    }
}

impl std::fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingRule::MatchCountry {
                country_code,
                use_provider,
            } => write!(f, "country={} -> {}", country_code, use_provider),
            RoutingRule::MatchAppAndCountry {
                app_id,
                country_code,
                use_provider,
            } => write!(
                f,
                "app={} country={} -> {}",
                app_id, country_code, use_provider
            ),
            RoutingRule::Default { use_provider } => write!(f, "default -> {}", use_provider),
        }
    }
}
