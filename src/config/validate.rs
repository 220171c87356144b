//! Cross-reference checks over a decoded routing configuration.

use std::collections::HashMap;

use super::{RoutingConfig, SendCloudConfig, VendorConfig};

/// One violation: where it is and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON-pointer style path, e.g. `/rules/2/use_provider`
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True if some violation is reported at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path == path)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl RoutingConfig {
    /// Run every cross-reference check and report all violations together.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        self.check_unique_provider_names(&mut errors);
        self.check_use_provider(&mut errors);
        self.check_default_rule(&mut errors);
        self.check_sendcloud_templates(&mut errors);

        errors.into_result()
    }

    fn check_unique_provider_names(&self, errors: &mut ValidationErrors) {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (i, provider) in self.providers.iter().enumerate() {
            match first_seen.get(provider.name.as_str()) {
                Some(first) => errors.push(
                    format!("/providers/{}/name", i),
                    format!(
                        "provider name '{}' already used by /providers/{}",
                        provider.name, first
                    ),
                ),
                None => {
                    first_seen.insert(provider.name.as_str(), i);
                }
            }
        }
    }

    fn check_use_provider(&self, errors: &mut ValidationErrors) {
        for (i, rule) in self.rules.iter().enumerate() {
            let name = rule.use_provider();
            if self.provider(name).is_none() {
                errors.push(
                    format!("/rules/{}/use_provider", i),
                    format!("provider '{}' not found", name),
                );
            }
        }
    }

    fn check_default_rule(&self, errors: &mut ValidationErrors) {
        if !self.rules.iter().any(|r| r.is_default()) {
            errors.push("/rules", "no rule of kind 'default' found");
        }
    }

    fn check_sendcloud_templates(&self, errors: &mut ValidationErrors) {
        for (i, provider) in self.providers.iter().enumerate() {
            if let VendorConfig::SendCloud(sendcloud) = &provider.vendor {
                check_template_assignments(
                    sendcloud,
                    &format!("/providers/{}/sendcloud", i),
                    errors,
                );
            }
        }
    }
}

fn check_template_assignments(config: &SendCloudConfig, path: &str, errors: &mut ValidationErrors) {
    for (i, assignment) in config.template_assignments.iter().enumerate() {
        let assignment_path = format!("{}/template_assignments/{}", path, i);

        if config.template(&assignment.default_template_id).is_none() {
            errors.push(
                format!("{}/default_template_id", assignment_path),
                format!("template_id '{}' not found", assignment.default_template_id),
            );
        }

        for (j, by_language) in assignment.by_languages.iter().enumerate() {
            if config.template(&by_language.template_id).is_none() {
                errors.push(
                    format!("{}/by_languages/{}/template_id", assignment_path, j),
                    format!("template_id '{}' not found", by_language.template_id),
                );
            }
        }
    }
}
