//! Integration tests for loading and validating configuration files.
//!
//! Each test writes its TOML into its own temporary directory and goes
//! through `Config::from_file`, the same path `smsgate serve` uses.

use std::fs;

use smsgate::config::{Config, ConfigError, ProviderType, RoutingRule, VendorConfig};

fn load(toml: &str) -> Result<Config, ConfigError> {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("smsgate.toml");
    fs::write(&path, toml).expect("write config");
    Config::from_file(&path)
}

fn validation_paths(err: &ConfigError) -> Vec<String> {
    err.violations()
        .unwrap_or_else(|| panic!("expected field violations, got: {}", err))
        .iter()
        .map(|e| e.path.clone())
        .collect()
}

const PROVIDERS: &str = r#"
[[providers]]
name = "twilio-global"
type = "twilio"
[providers.twilio]
sender = "+15005550006"
account_sid = "AC123"
auth_token = "token"
message_service_sid = "MG123"

[[providers]]
name = "accessyou-hk"
type = "accessyou"
[providers.accessyou]
sender = "GATEWAY"
accountno = "11012345"
user = "11012345"
pwd = "pwd"

[[providers]]
name = "sendcloud-cn"
type = "sendcloud"
[providers.sendcloud]
sms_user = "gateway"
sms_key = "key"

[[providers.sendcloud.templates]]
template_id = "1001"
template_msg_type = "0"

[[providers.sendcloud.templates]]
template_id = "1002"
template_msg_type = "0"

[[providers.sendcloud.template_assignments]]
template_name = "verification"
default_template_id = "1001"
by_languages = [{ language_tag = "zh-CN", template_id = "1002" }]
"#;

#[test]
fn test_load_complete_config() {
    let toml = format!(
        r#"
[server]
listen = "0.0.0.0:8091"

{}

[[rules]]
kind = "match_country"
country_code = "HK"
use_provider = "accessyou-hk"

[[rules]]
kind = "match_app_and_country"
app_id = "shop"
country_code = "CN"
use_provider = "sendcloud-cn"

[[rules]]
kind = "default"
use_provider = "twilio-global"
"#,
        PROVIDERS
    );

    let config = load(&toml).expect("config should load");
    assert_eq!(config.server.listen, "0.0.0.0:8091");
    assert_eq!(config.routing.providers.len(), 3);
    assert_eq!(
        config.routing.rules,
        vec![
            RoutingRule::match_country("HK", "accessyou-hk"),
            RoutingRule::match_app_and_country("shop", "CN", "sendcloud-cn"),
            RoutingRule::default_to("twilio-global"),
        ]
    );

    let sendcloud = config.routing.provider("sendcloud-cn").unwrap();
    assert_eq!(sendcloud.provider_type(), ProviderType::SendCloud);
    match &sendcloud.vendor {
        VendorConfig::SendCloud(c) => {
            assert_eq!(c.templates.len(), 2);
            assert_eq!(c.template_assignments[0].by_languages[0].template_id, "1002");
        }
        other => panic!("unexpected vendor block: {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    assert!(matches!(load("[[providers]\nname ="), Err(ConfigError::Parse(_))));
}

#[test]
fn test_undefined_use_provider_reports_rule_index() {
    let toml = format!(
        r#"
{}

[[rules]]
kind = "default"
use_provider = "twilio-global"

[[rules]]
kind = "match_country"
country_code = "JP"
use_provider = "nexmo-jp"
"#,
        PROVIDERS
    );

    let err = load(&toml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert_eq!(validation_paths(&err), vec!["/rules/1/use_provider"]);
    assert!(err.to_string().contains("nexmo-jp"));
}

#[test]
fn test_zero_default_rules_rejected() {
    let toml = format!(
        r#"
{}

[[rules]]
kind = "match_country"
country_code = "HK"
use_provider = "accessyou-hk"
"#,
        PROVIDERS
    );

    let err = load(&toml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert_eq!(validation_paths(&err), vec!["/rules"]);
}

#[test]
fn test_empty_rules_rejected_before_selection() {
    let toml = format!("rules = []\n{}", PROVIDERS);
    let err = load(&toml).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
    assert_eq!(validation_paths(&err), vec!["/rules"]);
}

#[test]
fn test_missing_rules_rejected() {
    let err = load(PROVIDERS).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
    assert_eq!(validation_paths(&err), vec!["/rules"]);
}

#[test]
fn test_sendcloud_assignment_to_unknown_template_rejected() {
    let toml = format!(
        r#"
{}

[[rules]]
kind = "default"
use_provider = "twilio-global"
"#,
        PROVIDERS.replace(
            r#"default_template_id = "1001""#,
            r#"default_template_id = "4040""#
        )
    );

    let err = load(&toml).unwrap_err();
    assert_eq!(
        validation_paths(&err),
        vec!["/providers/2/sendcloud/template_assignments/0/default_template_id"]
    );
}

#[test]
fn test_schema_violations_accumulate() {
    let toml = r#"
[[providers]]
name = "broken"
type = "twilio"
[providers.twilio]
sender = "+15005550006"
auth_token = 42
region = "us1"

[[rules]]
kind = "match_country"
use_provider = "broken"

[[rules]]
kind = "fallback"
use_provider = "broken"
"#;

    let err = load(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
    let paths = validation_paths(&err);
    for expected in [
        "/providers/0/twilio/account_sid",
        "/providers/0/twilio/auth_token",
        "/providers/0/twilio/region",
        "/rules/0/country_code",
        "/rules/1/kind",
    ] {
        assert!(
            paths.iter().any(|p| p == expected),
            "missing {} in {:?}",
            expected,
            paths
        );
    }
}

#[test]
fn test_env_expansion_in_vendor_blocks() {
    let var_name = "SMSGATE_TEST_CONFIG_FILE_TWILIO_TOKEN";
    unsafe { std::env::set_var(var_name, "expanded-token") };

    let toml = format!(
        r#"
[[providers]]
name = "twilio-global"
type = "twilio"
[providers.twilio]
sender = "+15005550006"
account_sid = "AC123"
auth_token = "${{{}}}"

[[rules]]
kind = "default"
use_provider = "twilio-global"
"#,
        var_name
    );

    let config = load(&toml).expect("config should load");
    match &config.routing.providers[0].vendor {
        VendorConfig::Twilio(c) => assert_eq!(c.auth_token.expose_secret(), "expanded-token"),
        other => panic!("unexpected vendor block: {:?}", other),
    }

    unsafe { std::env::remove_var(var_name) };
}

#[test]
fn test_env_expansion_missing_var_names_provider() {
    let var_name = "SMSGATE_TEST_CONFIG_FILE_DEFINITELY_MISSING";
    unsafe { std::env::remove_var(var_name) };

    let toml = format!(
        r#"
[[providers]]
name = "nexmo-eu"
type = "nexmo"
[providers.nexmo]
sender = "GW"
api_key = "key"
api_secret = "${{{}}}"

[[rules]]
kind = "default"
use_provider = "nexmo-eu"
"#,
        var_name
    );

    let err = load(&toml).unwrap_err();
    assert!(matches!(err, ConfigError::EnvVar { .. }));
    let message = err.to_string();
    assert!(message.contains(var_name));
    assert!(message.contains("nexmo-eu"));
}
