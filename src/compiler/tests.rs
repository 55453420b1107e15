//! Tests for the compiler module.

use super::*;
use crate::config::{CompileOptions, SecurityConfig};
use crate::error::{CompileStage, ItsError, Result, ViolationKind};
use crate::schema::{OverrideKind, SchemaCache, SchemaFetcher};
use crate::template::CompilerConfig;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

const BASE_SCHEMA: &str = "https://schemas.example.com/its/base.json";
const EXTRA_SCHEMA: &str = "https://schemas.example.com/its/extra.json";

#[derive(Debug, Default)]
struct StaticFetcher {
    bodies: BTreeMap<String, Value>,
    calls: AtomicUsize,
}

impl SchemaFetcher for StaticFetcher {
    fn fetch(&self, url: &Url) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ItsError::schema_load(url.as_str(), "not found"))
    }
}

fn fetcher() -> Arc<StaticFetcher> {
    let mut bodies = BTreeMap::new();
    bodies.insert(
        BASE_SCHEMA.to_string(),
        json!({"instructionTypes": {
            "paragraph": {"template": "Write a paragraph: {description}"},
            "list": {"template": "List {count} items: {description}"}
        }}),
    );
    bodies.insert(
        EXTRA_SCHEMA.to_string(),
        json!({"instructionTypes": {
            "paragraph": {"template": "Write one short paragraph: {description}"}
        }}),
    );
    Arc::new(StaticFetcher {
        bodies,
        calls: AtomicUsize::new(0),
    })
}

fn compiler() -> Compiler {
    compiler_with(fetcher())
}

fn compiler_with(fetcher: Arc<StaticFetcher>) -> Compiler {
    Compiler::with_fetcher(
        SecurityConfig::default(),
        Arc::new(SchemaCache::new()),
        fetcher,
    )
    .unwrap()
}

fn compile(template: Value) -> Result<CompilationResult> {
    compiler().compile(&template, None, &CompileOptions::default())
}

fn compile_with(template: Value, variables: Value) -> Result<CompilationResult> {
    let variables: Map<String, Value> = variables.as_object().cloned().unwrap();
    compiler().compile(&template, Some(&variables), &CompileOptions::default())
}

fn body(result: &CompilationResult) -> &str {
    result
        .prompt
        .split_once("TEMPLATE\n\n")
        .map(|(_, body)| body)
        .unwrap()
}

// ============================================================================
// Compile tests
// ============================================================================

#[test]
fn test_interpolates_declared_variable() {
    let result = compile(json!({
        "version": "1.0.0",
        "variables": {"topic": "x"},
        "content": [{"type": "text", "text": "About ${topic}"}]
    }))
    .unwrap();
    assert_eq!(body(&result), "About x");
}

#[test]
fn test_text_elements_appear_verbatim_in_order() {
    let result = compile(json!({
        "version": "1.0.0",
        "content": [
            {"type": "text", "text": "first\n"},
            {"type": "text", "text": "second\n"},
            {"type": "text", "text": "third"}
        ]
    }))
    .unwrap();
    assert_eq!(body(&result), "first\nsecond\nthird");
}

#[test]
fn test_prompt_has_fixed_sections() {
    let result = compile(json!({
        "version": "1.0.0",
        "content": [{"type": "text", "text": "hi"}]
    }))
    .unwrap();
    let prompt = &result.prompt;
    let intro = prompt.find("INTRODUCTION\n\n").unwrap();
    let instructions = prompt.find("\n\nINSTRUCTIONS\n\n1. ").unwrap();
    let template = prompt.find("\n\nTEMPLATE\n\n").unwrap();
    assert!(intro < instructions && instructions < template);
    assert!(prompt.contains(crate::template::DEFAULT_SYSTEM_PROMPT));
    assert!(prompt.contains("<< and end with >>"));
}

#[test]
fn test_caller_variables_override_declared() {
    let result = compile_with(
        json!({
            "version": "1.0.0",
            "variables": {"topic": "x", "kept": "k"},
            "content": [{"type": "text", "text": "${topic}/${kept}"}]
        }),
        json!({"topic": "y"}),
    )
    .unwrap();
    assert_eq!(body(&result), "y/k");
    assert_eq!(result.variables["topic"], json!("y"));
}

#[test]
fn test_conditional_keeps_content_when_true() {
    let template = json!({
        "version": "1.0.0",
        "content": [{
            "type": "conditional",
            "condition": "count > 3",
            "content": [{"type": "text", "text": "many"}],
            "else": [{"type": "text", "text": "few"}]
        }]
    });
    let many = compile_with(template.clone(), json!({"count": 5})).unwrap();
    assert_eq!(body(&many), "many");

    let few = compile_with(template, json!({"count": 2})).unwrap();
    assert_eq!(body(&few), "few");
}

#[test]
fn test_false_conditional_without_else_emits_nothing() {
    let result = compile_with(
        json!({
            "version": "1.0.0",
            "content": [
                {"type": "text", "text": "a"},
                {"type": "conditional", "condition": "show", "content": [
                    {"type": "text", "text": "hidden"}
                ]},
                {"type": "text", "text": "b"}
            ]
        }),
        json!({"show": false}),
    )
    .unwrap();
    assert_eq!(body(&result), "ab");
}

#[test]
fn test_nested_conditionals_flatten_in_order() {
    let result = compile_with(
        json!({
            "version": "1.0.0",
            "content": [{"type": "conditional", "condition": "outer", "content": [
                {"type": "text", "text": "1"},
                {"type": "conditional", "condition": "inner", "content": [
                    {"type": "text", "text": "2"}
                ], "else": [
                    {"type": "text", "text": "3"}
                ]},
                {"type": "text", "text": "4"}
            ]}]
        }),
        json!({"outer": true, "inner": false}),
    )
    .unwrap();
    assert_eq!(body(&result), "134");
}

#[test]
fn test_condition_interpolation_is_literal() {
    let result = compile_with(
        json!({
            "version": "1.0.0",
            "content": [{"type": "conditional", "condition": "${role} == 'admin'", "content": [
                {"type": "text", "text": "admin"}
            ], "else": [
                {"type": "text", "text": "user"}
            ]}]
        }),
        json!({"role": "admin"}),
    )
    .unwrap();
    assert_eq!(body(&result), "admin");
}

#[test]
fn test_control_character_in_condition_variable_is_resolution_error() {
    let err = compile(json!({
        "version": "1.0.0",
        "variables": {"name": "a\u{1}b"},
        "content": [{"type": "conditional", "condition": "${name} == 'x'", "content": [
            {"type": "text", "text": "x"}
        ]}]
    }))
    .unwrap_err();
    match err {
        ItsError::VariableResolution(e) => {
            assert_eq!(e.path, "name");
            assert!(e.reason.contains("U+0001"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_undefined_reference_fails_closed() {
    let err = compile(json!({
        "version": "1.0.0",
        "content": [{"type": "text", "text": "Hello ${name}"}]
    }))
    .unwrap_err();
    match err {
        ItsError::VariableResolution(e) => assert_eq!(e.path, "name"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_condition_failure_carries_element_context() {
    let err = compile(json!({
        "version": "1.0.0",
        "content": [
            {"type": "text", "text": "a"},
            {"type": "conditional", "id": "gate", "condition": "missing > 1", "content": [
                {"type": "text", "text": "b"}
            ]}
        ]
    }))
    .unwrap_err();
    match err {
        ItsError::Compilation {
            stage,
            message,
            element,
        } => {
            assert_eq!(stage, CompileStage::ConditionalEvaluation);
            assert!(message.contains("missing > 1"));
            let element = element.unwrap();
            assert_eq!(element.index, 1);
            assert_eq!(element.id.as_deref(), Some("gate"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_security_violation_aborts_compile() {
    let err = compile(json!({
        "version": "1.0.0",
        "content": [{"type": "text", "text": "<script>alert(1)</script>"}]
    }))
    .unwrap_err();
    assert_eq!(
        err.as_security().map(|v| v.kind),
        Some(ViolationKind::MaliciousContent)
    );
}

#[test]
fn test_caller_variables_are_vetted() {
    let err = compile_with(
        json!({
            "version": "1.0.0",
            "content": [{"type": "text", "text": "x"}]
        }),
        json!({"__proto__": {"admin": true}}),
    )
    .unwrap_err();
    assert_eq!(
        err.as_security().map(|v| v.kind),
        Some(ViolationKind::PrototypePollution)
    );
}

#[test]
fn test_structural_failure_is_validation_error() {
    let err = compile(json!({"content": []})).unwrap_err();
    match err {
        ItsError::Validation { errors } => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error {:?}", other),
    }
}

// ============================================================================
// Placeholder tests
// ============================================================================

#[test]
fn test_placeholder_renders_through_schema_and_wrapper() {
    let result = compile(json!({
        "version": "1.0.0",
        "extends": [BASE_SCHEMA],
        "content": [
            {"type": "text", "text": "Intro: "},
            {"type": "placeholder", "instructionType": "list", "config": {
                "description": "fruits",
                "count": 3
            }}
        ]
    }))
    .unwrap();
    assert_eq!(body(&result), "Intro: <<List 3 items: fruits>>");
}

#[test]
fn test_placeholder_config_is_interpolated() {
    let result = compile_with(
        json!({
            "version": "1.0.0",
            "extends": [BASE_SCHEMA],
            "content": [{"type": "placeholder", "instructionType": "paragraph", "config": {
                "description": "about ${topic}"
            }}]
        }),
        json!({"topic": "owls"}),
    )
    .unwrap();
    assert_eq!(body(&result), "<<Write a paragraph: about owls>>");
}

#[test]
fn test_custom_wrapper_and_instructions_are_used() {
    let result = compile(json!({
        "version": "1.0.0",
        "customInstructionTypes": {"note": {"template": "Note on {description} {unknown}"}},
        "compilerConfig": {
            "systemPrompt": "SYSTEM",
            "instructionWrapper": "[[{instruction}]]",
            "processingInstructions": ["Only this."]
        },
        "content": [{"type": "placeholder", "instructionType": "note", "config": {
            "description": "birds"
        }}]
    }))
    .unwrap();
    assert_eq!(
        result.prompt,
        "INTRODUCTION\n\nSYSTEM\n\nINSTRUCTIONS\n\n1. Only this.\n\nTEMPLATE\n\n[[Note on birds {unknown}]]"
    );
}

#[test]
fn test_unknown_instruction_type_fails_at_assembly() {
    let err = compile(json!({
        "version": "1.0.0",
        "extends": [BASE_SCHEMA],
        "content": [{"type": "placeholder", "id": "p1", "instructionType": "poem", "config": {
            "description": "x"
        }}]
    }))
    .unwrap_err();
    match err {
        ItsError::Compilation {
            stage,
            message,
            element,
        } => {
            assert_eq!(stage, CompileStage::PromptAssembly);
            assert!(message.contains("unknown instruction type 'poem'"));
            assert!(message.contains("available: list, paragraph"));
            assert_eq!(element.unwrap().id.as_deref(), Some("p1"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_overrides_are_reported_and_custom_wins() {
    let result = compile(json!({
        "version": "1.0.0",
        "extends": [BASE_SCHEMA, EXTRA_SCHEMA],
        "customInstructionTypes": {"paragraph": {"template": "Custom: {description}"}},
        "content": [{"type": "placeholder", "instructionType": "paragraph", "config": {
            "description": "x"
        }}]
    }))
    .unwrap();
    assert_eq!(body(&result), "<<Custom: x>>");
    assert_eq!(result.overrides.len(), 2);
    assert_eq!(result.overrides[0].kind, OverrideKind::SchemaExtension);
    assert_eq!(result.overrides[1].kind, OverrideKind::Custom);
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn test_schemas_are_cached_across_compilations() {
    let fetcher = fetcher();
    let compiler = compiler_with(Arc::clone(&fetcher));
    let template = json!({
        "version": "1.0.0",
        "extends": [BASE_SCHEMA],
        "content": [{"type": "text", "text": "x"}]
    });
    compiler
        .compile(&template, None, &CompileOptions::default())
        .unwrap();
    compiler
        .compile(&template, None, &CompileOptions::default())
        .unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_relative_extends_resolve_against_base_url() {
    let options = CompileOptions::with_base_url("https://schemas.example.com/its/");
    let result = compiler()
        .compile(
            &json!({
                "version": "1.0.0",
                "extends": ["base.json"],
                "content": [{"type": "placeholder", "instructionType": "paragraph", "config": {
                    "description": "x"
                }}]
            }),
            None,
            &options,
        )
        .unwrap();
    assert_eq!(body(&result), "<<Write a paragraph: x>>");
}

#[test]
fn test_validate_resolves_relative_extends_against_base_url() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": ["base.json"],
            "content": [{"type": "placeholder", "instructionType": "paragraph", "config": {
                "description": "x"
            }}]
        }),
        Some("https://schemas.example.com/its/"),
    );
    assert!(report.is_valid, "{:?}", report);
    assert!(report.security_issues.is_empty());
}

#[test]
fn test_relative_extends_resolving_to_localhost_is_rejected() {
    let options = CompileOptions::with_base_url("https://localhost/its/");
    let err = compiler()
        .compile(
            &json!({
                "version": "1.0.0",
                "extends": ["base.json"],
                "content": [{"type": "text", "text": "x"}]
            }),
            None,
            &options,
        )
        .unwrap_err();
    assert_eq!(
        err.as_security().map(|v| v.kind),
        Some(ViolationKind::UrlRejected)
    );
}

#[test]
fn test_render_instruction_replaces_description_first() {
    let config = json!({"description": "{tone} text", "tone": "calm"});
    let rendered = render_instruction("{description}!", config.as_object().unwrap());
    assert_eq!(rendered, "calm text!");
}

#[test]
fn test_default_instructions_name_configured_markers() {
    let config = CompilerConfig {
        instruction_wrapper: Some("{{{instruction}}}".to_string()),
        user_content_wrapper: Some("<user>{content}</user>".to_string()),
        ..CompilerConfig::default()
    };
    let instructions = default_processing_instructions(&config).join("\n");
    assert!(instructions.contains("start with {{ and end with }}"));
    assert!(instructions.contains("between <user> and </user>"));
}

// ============================================================================
// Entry point tests
// ============================================================================

#[test]
fn test_compile_str_rejects_invalid_json() {
    let err = compiler()
        .compile_str("{not json", None, &CompileOptions::default())
        .unwrap_err();
    assert!(matches!(err, ItsError::UserError(_)));
}

#[test]
fn test_compile_file_reads_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.json");
    std::fs::write(
        &path,
        r#"{"version": "1.0.0", "content": [{"type": "text", "text": "from file"}]}"#,
    )
    .unwrap();

    let result = compiler()
        .compile_file(&path, None, &CompileOptions::default())
        .unwrap();
    assert_eq!(body(&result), "from file");

    let missing = compiler().compile_file(dir.path().join("nope.json"), None, &CompileOptions::default());
    assert!(matches!(missing, Err(ItsError::UserError(_))));
}

#[test]
fn test_invalid_security_config_is_rejected() {
    let config = SecurityConfig {
        max_template_size: 0,
        ..SecurityConfig::default()
    };
    assert!(Compiler::new(config).is_err());
}

// ============================================================================
// Validate tests
// ============================================================================

#[test]
fn test_valid_template_reports_valid() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": [BASE_SCHEMA],
            "variables": {"topic": "x", "count": 2},
            "content": [
                {"type": "text", "text": "About ${topic}"},
                {"type": "conditional", "condition": "count > 1", "content": [
                    {"type": "placeholder", "instructionType": "paragraph", "config": {"description": "d"}}
                ]}
            ]
        }),
        None,
    );
    assert!(report.is_valid, "{:?}", report);
    assert!(report.errors.is_empty());
    assert!(report.security_issues.is_empty());
}

#[test]
fn test_validate_collects_every_problem() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": [BASE_SCHEMA],
            "content": [
                {"type": "text", "text": "Hi ${name}"},
                {"type": "placeholder", "instructionType": "poem", "config": {"description": "d"}},
                {"type": "conditional", "condition": "a >", "content": [
                    {"type": "text", "text": "x"}
                ]}
            ]
        }),
        None,
    );
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 3, "{:?}", report.errors);
    assert!(report.errors.iter().any(|e| e.contains("content[1]: unknown instruction type 'poem'")));
    assert!(report.errors.iter().any(|e| e.contains("${name}")));
    assert!(report.errors.iter().any(|e| e.starts_with("content[2].condition")));
}

#[test]
fn test_validate_reports_security_issues_without_failing() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": ["http://169.254.169.254/latest"],
            "content": [{"type": "text", "text": "javascript:alert(1)"}]
        }),
        None,
    );
    assert!(!report.is_valid);
    assert_eq!(report.security_issues.len(), 2, "{:?}", report.security_issues);
    assert!(report.errors.is_empty());
}

#[test]
fn test_validate_reports_structure_errors() {
    let report = compiler().validate(&json!({"version": 1, "content": "x"}), None);
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 2);
}

#[test]
fn test_validate_turns_overrides_into_warnings() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": [BASE_SCHEMA, EXTRA_SCHEMA],
            "content": [{"type": "text", "text": "x"}]
        }),
        None,
    );
    assert!(report.is_valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("'paragraph'"));
}

#[test]
fn test_validate_skips_unknown_types_when_schema_fails() {
    let report = compiler().validate(
        &json!({
            "version": "1.0.0",
            "extends": ["https://schemas.example.com/its/missing.json"],
            "content": [{"type": "placeholder", "instructionType": "paragraph", "config": {
                "description": "d"
            }}]
        }),
        None,
    );
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Failed to load schema"));
}
