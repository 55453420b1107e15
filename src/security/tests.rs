//! Tests for the security module.

use super::*;
use crate::config::SecurityConfig;
use crate::error::ViolationKind;
use serde_json::{Map, Value, json};

fn strict() -> SecurityValidator {
    SecurityValidator::new(SecurityConfig::default()).unwrap()
}

fn template_with(content: Value) -> Value {
    json!({
        "version": "1.0.0",
        "content": content,
    })
}

fn vars(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn kind_of(result: Result<(), crate::error::SecurityViolation>) -> ViolationKind {
    result.unwrap_err().kind
}

// ============================================================================
// Deny-list tests
// ============================================================================

#[test]
fn test_deny_lists_compile() {
    let text = DenyList::for_text().unwrap();
    let expressions = DenyList::for_expressions().unwrap();
    assert!(!text.is_empty());
    assert!(expressions.len() > text.len());
}

#[test]
fn test_invalid_pattern_is_reported() {
    let err = DenyList::compile(["("]).unwrap_err();
    assert!(err.to_string().contains("invalid deny-list pattern"));
}

#[test]
fn test_script_tags_match_in_any_case() {
    let text = DenyList::for_text().unwrap();
    assert!(text.find_match("hello <script>alert(1)</script>").is_some());
    assert!(text.find_match("hello <SCRIPT src=x>").is_some());
    assert!(text.find_match("JavaScript:void(0)").is_some());
    assert!(text.find_match("plain prose about scripts").is_none());
}

#[test]
fn test_event_handlers_and_encodings_match() {
    let text = DenyList::for_text().unwrap();
    assert!(text.find_match(r#"<img src=x onerror="x">"#).is_some());
    assert!(text.find_match(r"\x3c").is_some());
    assert!(text.find_match("&#60;").is_some());
    assert!(text.find_match("%3Cscript").is_some());
}

#[test]
fn test_unsafe_variable_names() {
    assert!(is_unsafe_variable_name("__proto__"));
    assert!(is_unsafe_variable_name("Constructor"));
    assert!(is_unsafe_variable_name("__anything"));
    assert!(is_unsafe_variable_name("eval"));
    assert!(!is_unsafe_variable_name("topic"));
    assert!(!is_unsafe_variable_name("input"));
}

// ============================================================================
// Template tests
// ============================================================================

#[test]
fn test_clean_template_passes() {
    let template = json!({
        "version": "1.0.0",
        "extends": ["https://example.com/schema.json"],
        "variables": {"topic": "testing", "items": [1, 2, 3]},
        "content": [
            {"type": "text", "text": "About "},
            {"type": "placeholder", "instructionType": "paragraph", "config": {"description": "Say something"}},
            {"type": "conditional", "condition": "count > 3", "content": [
                {"type": "text", "text": "many"}
            ]}
        ]
    });
    strict().validate_template(&template, None).unwrap();
}

#[test]
fn test_script_in_text_element_is_rejected() {
    let template = template_with(json!([
        {"type": "text", "text": "Hi <script>alert(1)</script>"}
    ]));
    let violation = strict().validate_template(&template, None).unwrap_err();
    assert_eq!(violation.kind, ViolationKind::MaliciousContent);
    assert!(violation.offending.unwrap().contains("<script>"));
}

#[test]
fn test_script_in_nested_conditional_text_is_rejected() {
    let template = template_with(json!([
        {"type": "conditional", "condition": "true", "content": [
            {"type": "text", "text": "fine"}
        ], "else": [
            {"type": "text", "text": "<ScRiPt>"}
        ]}
    ]));
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::MaliciousContent
    );
}

#[test]
fn test_javascript_url_in_placeholder_config_is_rejected() {
    let template = template_with(json!([
        {"type": "placeholder", "instructionType": "paragraph", "config": {
            "description": "ok",
            "nested": {"links": ["javascript:alert(1)"]}
        }}
    ]));
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::MaliciousContent
    );
}

#[test]
fn test_oversized_template_is_rejected() {
    let config = SecurityConfig {
        max_template_size: 64,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    let template = template_with(json!([
        {"type": "text", "text": "x".repeat(100)}
    ]));
    assert_eq!(
        kind_of(validator.validate_template(&template, None)),
        ViolationKind::TemplateTooLarge
    );
}

#[test]
fn test_too_many_elements_is_rejected() {
    let config = SecurityConfig {
        max_content_elements: 2,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    let template = template_with(json!([
        {"type": "text", "text": "a"},
        {"type": "conditional", "condition": "true", "content": [
            {"type": "text", "text": "b"}
        ]}
    ]));
    assert_eq!(
        kind_of(validator.validate_template(&template, None)),
        ViolationKind::TooManyElements
    );
}

fn nested_conditionals(depth: usize) -> Value {
    let mut content = json!([{"type": "text", "text": "leaf"}]);
    for _ in 0..depth {
        content = json!([{"type": "conditional", "condition": "true", "content": content}]);
    }
    content
}

#[test]
fn test_nesting_at_limit_passes() {
    let config = SecurityConfig {
        max_nesting_depth: 3,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    validator
        .validate_template(&template_with(nested_conditionals(3)), None)
        .unwrap();
}

#[test]
fn test_nesting_past_limit_is_rejected() {
    let config = SecurityConfig {
        max_nesting_depth: 3,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    assert_eq!(
        kind_of(validator.validate_template(&template_with(nested_conditionals(4)), None)),
        ViolationKind::NestingTooDeep
    );
}

#[test]
fn test_non_object_template_is_rejected() {
    assert_eq!(
        kind_of(strict().validate_template(&json!([1, 2]), None)),
        ViolationKind::InvalidDocument
    );
}

#[test]
fn test_insecure_extends_url_is_rejected() {
    let template = json!({
        "version": "1.0.0",
        "extends": ["http://example.com/schema.json"],
        "content": [{"type": "text", "text": "x"}]
    });
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::UrlRejected
    );
}

#[test]
fn test_relative_extends_url_is_checked_after_resolution() {
    let template = json!({
        "version": "1.0.0",
        "extends": ["base.json"],
        "content": [{"type": "text", "text": "x"}]
    });
    strict()
        .validate_template(&template, Some("https://schemas.example.com/its/"))
        .unwrap();
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::UrlRejected
    );
    assert_eq!(
        kind_of(strict().validate_template(&template, Some("https://127.0.0.1/its/"))),
        ViolationKind::UrlRejected
    );
}

// ============================================================================
// Expression tests
// ============================================================================

#[test]
fn test_plain_expressions_pass() {
    let validator = strict();
    validator.validate_expression("count > 3").unwrap();
    validator
        .validate_expression("user.role == \"admin\" and items.length > 0")
        .unwrap();
}

#[test]
fn test_dunder_access_in_condition_is_rejected() {
    let template = template_with(json!([
        {"type": "conditional", "condition": "x.__class__", "content": [
            {"type": "text", "text": "a"}
        ]}
    ]));
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::MaliciousExpression
    );
}

#[test]
fn test_introspection_calls_are_rejected() {
    let validator = strict();
    for expression in ["exec('x')", "import os", "getattr(a, 'b')", "a.constructor"] {
        assert_eq!(
            kind_of(validator.validate_expression(expression)),
            ViolationKind::MaliciousExpression,
            "expected rejection of {}",
            expression
        );
    }
}

#[test]
fn test_long_expression_is_rejected() {
    let config = SecurityConfig {
        max_expression_length: 10,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    validator.validate_expression("count > 3").unwrap();
    assert_eq!(
        kind_of(validator.validate_expression("count > 3 && a")),
        ViolationKind::ExpressionTooLong
    );
}

// ============================================================================
// Variable tests
// ============================================================================

#[test]
fn test_proto_key_is_prototype_pollution() {
    let violation = strict()
        .validate_variables(&vars(json!({"__proto__": {"polluted": true}})))
        .unwrap_err();
    assert_eq!(violation.kind, ViolationKind::PrototypePollution);
    assert_eq!(violation.offending.as_deref(), Some("__proto__"));
}

#[test]
fn test_proto_key_in_template_variables_is_rejected() {
    let template = json!({
        "version": "1.0.0",
        "variables": {"constructor": 1},
        "content": [{"type": "text", "text": "x"}]
    });
    assert_eq!(
        kind_of(strict().validate_template(&template, None)),
        ViolationKind::PrototypePollution
    );
}

#[test]
fn test_nested_unsafe_key_is_rejected() {
    let result = strict().validate_variables(&vars(json!({
        "user": {"profile": {"eval": "x"}}
    })));
    assert_eq!(kind_of(result), ViolationKind::UnsafeVariableName);
}

#[test]
fn test_script_in_variable_value_is_rejected() {
    let violation = strict()
        .validate_variables(&vars(json!({
            "user": {"bio": ["ok", "<script>x</script>"]}
        })))
        .unwrap_err();
    assert_eq!(violation.kind, ViolationKind::MaliciousContent);
    assert!(violation.message.contains("variables.user.bio[1]"));
}

#[test]
fn test_oversized_array_is_rejected() {
    let config = SecurityConfig {
        max_array_length: 3,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    validator
        .validate_variables(&vars(json!({"items": [1, 2, 3]})))
        .unwrap();
    assert_eq!(
        kind_of(validator.validate_variables(&vars(json!({"items": [1, 2, 3, 4]})))),
        ViolationKind::ArrayTooLarge
    );
}

#[test]
fn test_deep_variable_tree_is_rejected() {
    let config = SecurityConfig {
        max_nesting_depth: 2,
        ..SecurityConfig::default()
    };
    let validator = SecurityValidator::new(config).unwrap();
    validator
        .validate_variables(&vars(json!({"a": {"b": 1}})))
        .unwrap();
    assert_eq!(
        kind_of(validator.validate_variables(&vars(json!({"a": {"b": {"c": {"d": 1}}}})))),
        ViolationKind::NestingTooDeep
    );
}

// ============================================================================
// URL tests
// ============================================================================

#[test]
fn test_https_url_passes() {
    let url = validate_url(
        "https://schemas.example.com/its/v1.json",
        &SecurityConfig::default(),
    )
    .unwrap();
    assert_eq!(url.host_str(), Some("schemas.example.com"));
}

#[test]
fn test_http_requires_opt_in() {
    let config = SecurityConfig::default();
    assert!(validate_url("http://example.com/s.json", &config).is_err());

    let config = SecurityConfig {
        allow_http: true,
        ..SecurityConfig::default()
    };
    validate_url("http://example.com/s.json", &config).unwrap();
}

#[test]
fn test_metadata_address_is_rejected_even_with_http_allowed() {
    let config = SecurityConfig {
        allow_http: true,
        ..SecurityConfig::default()
    };
    let violation = validate_url("http://169.254.169.254/", &config).unwrap_err();
    assert_eq!(violation.kind, ViolationKind::UrlRejected);
    assert!(violation.message.contains("private network"));
}

#[test]
fn test_denied_schemes_are_rejected() {
    let config = SecurityConfig::development();
    for url in [
        "file:///etc/passwd",
        "ftp://example.com/s.json",
        "gopher://example.com/",
        "data:application/json,{}",
    ] {
        let violation = validate_url(url, &config).unwrap_err();
        assert_eq!(violation.kind, ViolationKind::UrlRejected, "{}", url);
    }
}

#[test]
fn test_localhost_and_loopback_are_rejected() {
    let config = SecurityConfig::default();
    for url in [
        "https://localhost/s.json",
        "https://api.localhost/s.json",
        "https://127.0.0.1/s.json",
        "https://[::1]/s.json",
        "https://0.0.0.0/s.json",
        "https://[::ffff:127.0.0.1]/s.json",
    ] {
        assert!(validate_url(url, &config).is_err(), "{}", url);
    }
}

#[test]
fn test_private_ranges_are_rejected() {
    let config = SecurityConfig::default();
    for url in [
        "https://10.0.0.5/s.json",
        "https://172.16.1.1/s.json",
        "https://192.168.1.10/s.json",
        "https://[fd00::1]/s.json",
        "https://[fe80::1]/s.json",
    ] {
        assert!(validate_url(url, &config).is_err(), "{}", url);
    }
    validate_url("https://8.8.8.8/s.json", &config).unwrap();
}

#[test]
fn test_development_preset_allows_local_hosts() {
    let config = SecurityConfig::development();
    validate_url("http://localhost:8080/schema.json", &config).unwrap();
    validate_url("http://127.0.0.1:8080/schema.json", &config).unwrap();
    validate_url("http://192.168.1.10/schema.json", &config).unwrap();
}

#[test]
fn test_traversal_is_rejected() {
    let config = SecurityConfig::default();
    assert!(validate_url("https://example.com/a/../secret.json", &config).is_err());
    assert!(validate_url("https://example.com/a/%2e%2e/secret.json", &config).is_err());
}

#[test]
fn test_allowlist_permits_subdomains_only_of_listed_hosts() {
    let config = SecurityConfig {
        domain_allowlist: Some(vec!["example.com".to_string()]),
        ..SecurityConfig::default()
    };
    validate_url("https://example.com/s.json", &config).unwrap();
    validate_url("https://schemas.example.com/s.json", &config).unwrap();
    assert!(validate_url("https://badexample.com/s.json", &config).is_err());
    assert!(validate_url("https://example.com.evil.net/s.json", &config).is_err());
}

#[test]
fn test_allowlist_requires_exact_ip_match() {
    let config = SecurityConfig {
        domain_allowlist: Some(vec!["8.8.8.8".to_string()]),
        ..SecurityConfig::default()
    };
    validate_url("https://8.8.8.8/s.json", &config).unwrap();
    assert!(validate_url("https://8.8.4.4/s.json", &config).is_err());
}

#[test]
fn test_validator_delegates_url_checks() {
    let validator = strict();
    assert!(validator.validate_url("https://example.com/s.json").is_ok());
    assert!(validator.validate_url("not a url").is_err());
}
