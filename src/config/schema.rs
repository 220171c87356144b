//! Structural schema check over the raw routing document.
//!
//! Runs before decoding so that every shape problem (missing fields, unknown
//! fields, wrong types, values outside a closed set, conditional fields) is
//! reported with its path in one pass instead of stopping at the first
//! deserialization error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{ProviderType, RoutingRule, ValidationErrors};

static ALPHA2_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// An object whose fields are all strings.
struct StringFields {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

const TWILIO: StringFields = StringFields {
    required: &["sender", "account_sid", "auth_token"],
    optional: &["message_service_sid", "base_url"],
};

const NEXMO: StringFields = StringFields {
    required: &["sender", "api_key", "api_secret"],
    optional: &["base_url"],
};

const ACCESSYOU: StringFields = StringFields {
    required: &["sender", "accountno", "user", "pwd"],
    optional: &["base_url"],
};

const SENDCLOUD_TEMPLATE: StringFields = StringFields {
    required: &["template_id", "template_msg_type"],
    optional: &[],
};

const LANGUAGE_TEMPLATE: StringFields = StringFields {
    required: &["language_tag", "template_id"],
    optional: &[],
};

const SENDCLOUD_FIELDS: &[&str] = &[
    "sms_user",
    "sms_key",
    "base_url",
    "templates",
    "template_assignments",
];

const ASSIGNMENT_FIELDS: &[&str] = &["template_name", "default_template_id", "by_languages"];

const RULE_FIELDS: &[&str] = &["kind", "use_provider", "country_code", "app_id"];

#[derive(Clone, Copy)]
enum Presence {
    Required,
    Optional,
    Forbidden,
}

pub(super) fn check(doc: &Value) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Some(root) = as_object(doc, "", &mut errors) {
        allow_fields(root, "", &["providers", "rules"], &mut errors);

        if let Some(providers) = required_array(root, "", "providers", &mut errors) {
            for (i, provider) in providers.iter().enumerate() {
                check_provider(provider, &format!("/providers/{}", i), &mut errors);
            }
        }

        if let Some(rules) = required_array(root, "", "rules", &mut errors) {
            for (i, rule) in rules.iter().enumerate() {
                check_rule(rule, &format!("/rules/{}", i), &mut errors);
            }
        }
    }

    errors.into_result()
}

fn check_provider(value: &Value, path: &str, errors: &mut ValidationErrors) {
    let Some(fields) = as_object(value, path, errors) else {
        return;
    };

    let mut allowed = vec!["name", "type"];
    allowed.extend(ProviderType::ALL.iter().map(|t| t.as_str()));
    allow_fields(fields, path, &allowed, errors);

    required_string(fields, path, "name", errors);

    let provider_type = match required_string(fields, path, "type", errors) {
        Some(name) => {
            let parsed = ProviderType::from_name(name);
            if parsed.is_none() {
                let choices: Vec<&str> = ProviderType::ALL.iter().map(|t| t.as_str()).collect();
                errors.push(
                    child(path, "type"),
                    format!("'{}' is not one of: {}", name, choices.join(", ")),
                );
            }
            parsed
        }
        None => None,
    };

    for vendor in ProviderType::ALL {
        let key = vendor.as_str();
        let Some(block) = fields.get(key) else {
            continue;
        };

        check_vendor_block(vendor, block, &child(path, key), errors);

        if let Some(declared) = provider_type {
            if declared != vendor {
                errors.push(
                    child(path, key),
                    format!("not allowed when type is '{}'", declared),
                );
            }
        }
    }

    if let Some(declared) = provider_type {
        if !fields.contains_key(declared.as_str()) {
            errors.push(
                child(path, declared.as_str()),
                format!("is required when type is '{}'", declared),
            );
        }
    }
}

fn check_vendor_block(vendor: ProviderType, value: &Value, path: &str, errors: &mut ValidationErrors) {
    match vendor {
        ProviderType::Twilio => check_string_fields(value, path, &TWILIO, errors),
        ProviderType::Nexmo => check_string_fields(value, path, &NEXMO, errors),
        ProviderType::AccessYou => check_string_fields(value, path, &ACCESSYOU, errors),
        ProviderType::SendCloud => check_sendcloud(value, path, errors),
    }
}

fn check_sendcloud(value: &Value, path: &str, errors: &mut ValidationErrors) {
    let Some(fields) = as_object(value, path, errors) else {
        return;
    };
    allow_fields(fields, path, SENDCLOUD_FIELDS, errors);
    required_string(fields, path, "sms_user", errors);
    required_string(fields, path, "sms_key", errors);
    optional_string(fields, path, "base_url", errors);

    if let Some(templates) = optional_array(fields, path, "templates", errors) {
        let templates_path = child(path, "templates");
        for (i, template) in templates.iter().enumerate() {
            let item_path = format!("{}/{}", templates_path, i);
            check_string_fields(template, &item_path, &SENDCLOUD_TEMPLATE, errors);
        }
    }

    if let Some(assignments) = optional_array(fields, path, "template_assignments", errors) {
        let assignments_path = child(path, "template_assignments");
        for (i, assignment) in assignments.iter().enumerate() {
            check_assignment(assignment, &format!("{}/{}", assignments_path, i), errors);
        }
    }
}

fn check_assignment(value: &Value, path: &str, errors: &mut ValidationErrors) {
    let Some(fields) = as_object(value, path, errors) else {
        return;
    };
    allow_fields(fields, path, ASSIGNMENT_FIELDS, errors);
    required_string(fields, path, "template_name", errors);
    required_string(fields, path, "default_template_id", errors);

    if let Some(by_languages) = optional_array(fields, path, "by_languages", errors) {
        let list_path = child(path, "by_languages");
        for (i, entry) in by_languages.iter().enumerate() {
            check_string_fields(entry, &format!("{}/{}", list_path, i), &LANGUAGE_TEMPLATE, errors);
        }
    }
}

fn check_rule(value: &Value, path: &str, errors: &mut ValidationErrors) {
    let Some(fields) = as_object(value, path, errors) else {
        return;
    };
    allow_fields(fields, path, RULE_FIELDS, errors);
    required_string(fields, path, "use_provider", errors);

    let kind = match required_string(fields, path, "kind", errors) {
        Some(kind) if RoutingRule::KINDS.contains(&kind) => Some(kind),
        Some(kind) => {
            errors.push(
                child(path, "kind"),
                format!("'{}' is not one of: {}", kind, RoutingRule::KINDS.join(", ")),
            );
            None
        }
        None => None,
    };

    let (country_code, app_id) = match kind {
        Some("match_country") => (Presence::Required, Presence::Forbidden),
        Some("match_app_and_country") => (Presence::Required, Presence::Required),
        Some("default") => (Presence::Forbidden, Presence::Forbidden),
        _ => (Presence::Optional, Presence::Optional),
    };
    let kind = kind.unwrap_or_default();

    if let Some(code) = conditional_string(fields, path, "country_code", country_code, kind, errors) {
        if !ALPHA2_CODE.is_match(code) {
            errors.push(
                child(path, "country_code"),
                format!("'{}' is not an upper-case ISO 3166-1 alpha-2 code", code),
            );
        }
    }
    conditional_string(fields, path, "app_id", app_id, kind, errors);
}

fn conditional_string<'a>(
    fields: &'a Map<String, Value>,
    path: &str,
    key: &str,
    presence: Presence,
    kind: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match presence {
        Presence::Required => {
            if !fields.contains_key(key) {
                errors.push(
                    child(path, key),
                    format!("is required when kind is '{}'", kind),
                );
                return None;
            }
            optional_string(fields, path, key, errors)
        }
        Presence::Optional => optional_string(fields, path, key, errors),
        Presence::Forbidden => {
            if fields.contains_key(key) {
                errors.push(
                    child(path, key),
                    format!("not allowed when kind is '{}'", kind),
                );
            }
            None
        }
    }
}

fn check_string_fields(value: &Value, path: &str, shape: &StringFields, errors: &mut ValidationErrors) {
    let Some(fields) = as_object(value, path, errors) else {
        return;
    };

    let allowed: Vec<&str> = shape.required.iter().chain(shape.optional).copied().collect();
    allow_fields(fields, path, &allowed, errors);

    for key in shape.required {
        required_string(fields, path, key, errors);
    }
    for key in shape.optional {
        optional_string(fields, path, key, errors);
    }
}

fn child(path: &str, key: &str) -> String {
    format!("{}/{}", path, key)
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        let at = if path.is_empty() { "/" } else { path };
        errors.push(at, "expected an object");
    }
    object
}

fn allow_fields(fields: &Map<String, Value>, path: &str, allowed: &[&str], errors: &mut ValidationErrors) {
    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.push(child(path, key), "unknown field");
        }
    }
}

fn required_string<'a>(
    fields: &'a Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    if !fields.contains_key(key) {
        errors.push(child(path, key), "is required");
        return None;
    }
    optional_string(fields, path, key, errors)
}

fn optional_string<'a>(
    fields: &'a Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    let value = fields.get(key)?;
    let s = value.as_str();
    if s.is_none() {
        errors.push(child(path, key), "expected a string");
    }
    s
}

fn required_array<'a>(
    fields: &'a Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Vec<Value>> {
    if !fields.contains_key(key) {
        errors.push(child(path, key), "is required");
        return None;
    }
    let items = optional_array(fields, path, key, errors)?;
    if items.is_empty() {
        errors.push(child(path, key), "must contain at least one item");
    }
    Some(items)
}

fn optional_array<'a>(
    fields: &'a Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Vec<Value>> {
    let value = fields.get(key)?;
    let items = value.as_array();
    if items.is_none() {
        errors.push(child(path, key), "expected an array");
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violations(doc: Value) -> ValidationErrors {
        check(&doc).unwrap_err()
    }

    fn twilio_provider(name: &str) -> Value {
        json!({
            "name": name,
            "type": "twilio",
            "twilio": { "sender": "+15005550006", "account_sid": "AC1", "auth_token": "t" }
        })
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = json!({
            "providers": [
                twilio_provider("tw"),
                {
                    "name": "sc",
                    "type": "sendcloud",
                    "sendcloud": {
                        "sms_user": "u",
                        "sms_key": "k",
                        "templates": [{ "template_id": "1", "template_msg_type": "0" }],
                        "template_assignments": [{
                            "template_name": "otp",
                            "default_template_id": "1",
                            "by_languages": [{ "language_tag": "en", "template_id": "1" }]
                        }]
                    }
                }
            ],
            "rules": [
                { "kind": "match_country", "country_code": "CN", "use_provider": "sc" },
                { "kind": "match_app_and_country", "app_id": "a", "country_code": "HK", "use_provider": "tw" },
                { "kind": "default", "use_provider": "tw" }
            ]
        });
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn test_missing_and_empty_top_level_lists() {
        let errors = violations(json!({ "rules": [], "extra": 1 }));
        assert!(errors.has_path("/providers"));
        assert!(errors.has_path("/rules"));
        assert!(errors.has_path("/extra"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_non_object_root() {
        let errors = violations(json!([1, 2]));
        assert!(errors.has_path("/"));
    }

    #[test]
    fn test_provider_block_must_match_type() {
        let errors = violations(json!({
            "providers": [{
                "name": "p",
                "type": "twilio",
                "nexmo": { "sender": "s", "api_key": "k", "api_secret": "x" }
            }],
            "rules": [{ "kind": "default", "use_provider": "p" }]
        }));
        assert!(errors.has_path("/providers/0/nexmo"));
        assert!(errors.has_path("/providers/0/twilio"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_vendor_block_fields_are_checked() {
        let errors = violations(json!({
            "providers": [{
                "name": "p",
                "type": "accessyou",
                "accessyou": { "sender": "s", "accountno": 42, "user": "u", "password": "x" }
            }],
            "rules": [{ "kind": "default", "use_provider": "p" }]
        }));
        assert!(errors.has_path("/providers/0/accessyou/accountno"));
        assert!(errors.has_path("/providers/0/accessyou/password"));
        assert!(errors.has_path("/providers/0/accessyou/pwd"));
    }

    #[test]
    fn test_sendcloud_nested_shapes() {
        let errors = violations(json!({
            "providers": [{
                "name": "sc",
                "type": "sendcloud",
                "sendcloud": {
                    "sms_user": "u",
                    "sms_key": "k",
                    "templates": [{ "template_id": "1" }],
                    "template_assignments": [{
                        "template_name": "otp",
                        "by_languages": [{ "language_tag": "en" }]
                    }]
                }
            }],
            "rules": [{ "kind": "default", "use_provider": "sc" }]
        }));
        assert!(errors.has_path("/providers/0/sendcloud/templates/0/template_msg_type"));
        assert!(errors.has_path("/providers/0/sendcloud/template_assignments/0/default_template_id"));
        assert!(errors.has_path(
            "/providers/0/sendcloud/template_assignments/0/by_languages/0/template_id"
        ));
    }

    #[test]
    fn test_rule_conditional_fields() {
        let errors = violations(json!({
            "providers": [twilio_provider("p")],
            "rules": [
                { "kind": "match_country", "use_provider": "p", "app_id": "a" },
                { "kind": "match_app_and_country", "country_code": "HK", "use_provider": "p" },
                { "kind": "default", "use_provider": "p", "country_code": "US" }
            ]
        }));
        assert!(errors.has_path("/rules/0/country_code"));
        assert!(errors.has_path("/rules/0/app_id"));
        assert!(errors.has_path("/rules/1/app_id"));
        assert!(errors.has_path("/rules/2/country_code"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_rule_kind_closed_set() {
        let errors = violations(json!({
            "providers": [twilio_provider("p")],
            "rules": [{ "kind": "match_regex", "use_provider": "p" }]
        }));
        assert!(errors.has_path("/rules/0/kind"));
        assert!(errors.to_string().contains("match_app_and_country"));
    }

    #[test]
    fn test_country_code_must_be_alpha2() {
        let errors = violations(json!({
            "providers": [twilio_provider("p")],
            "rules": [
                { "kind": "match_country", "country_code": "hk", "use_provider": "p" },
                { "kind": "match_country", "country_code": "HKG", "use_provider": "p" },
                { "kind": "default", "use_provider": "p" }
            ]
        }));
        assert!(errors.has_path("/rules/0/country_code"));
        assert!(errors.has_path("/rules/1/country_code"));
        assert_eq!(errors.len(), 2);
    }
}
