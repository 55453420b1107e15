//! Structural validation of a raw template document.
//!
//! Checks presence and types of the fields the compiler relies on. Every
//! problem is collected; nothing stops at the first hit. Security checks are
//! separate and run before this pass.

use super::model::Template;
use crate::error::{CompileStage, ItsError, Result};
use serde_json::{Map, Value};

const ELEMENT_TYPES: &[&str] = &["text", "placeholder", "conditional"];

const COMPILER_CONFIG_STRINGS: &[&str] =
    &["systemPrompt", "userContentWrapper", "instructionWrapper"];

/// Validate the shape of a template document.
///
/// Returns every structural error found, each prefixed with the JSON path
/// of the offending field. An empty vector means the document is well-formed.
pub fn validate_structure(doc: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(root) = doc.as_object() else {
        errors.push("template must be a JSON object".to_string());
        return errors;
    };

    match root.get("version") {
        None => errors.push("missing required field 'version'".to_string()),
        Some(Value::String(v)) if v.trim().is_empty() => {
            errors.push("'version' must not be empty".to_string())
        }
        Some(Value::String(_)) => {}
        Some(_) => errors.push("'version' must be a string".to_string()),
    }

    if let Some(description) = root.get("description") {
        if !description.is_string() {
            errors.push("'description' must be a string".to_string());
        }
    }

    if let Some(extends) = root.get("extends") {
        match extends.as_array() {
            Some(urls) => {
                for (i, url) in urls.iter().enumerate() {
                    if !url.is_string() {
                        errors.push(format!("extends[{}] must be a string URL", i));
                    }
                }
            }
            None => errors.push("'extends' must be an array of URLs".to_string()),
        }
    }

    if let Some(variables) = root.get("variables") {
        if !variables.is_object() {
            errors.push("'variables' must be an object".to_string());
        }
    }

    if let Some(custom) = root.get("customInstructionTypes") {
        validate_custom_types(custom, &mut errors);
    }

    if let Some(config) = root.get("compilerConfig") {
        validate_compiler_config(config, &mut errors);
    }

    match root.get("content") {
        None => errors.push("missing required field 'content'".to_string()),
        Some(Value::Array(elements)) if elements.is_empty() => {
            errors.push("'content' must contain at least one element".to_string())
        }
        Some(Value::Array(elements)) => validate_elements(elements, "content", &mut errors),
        Some(_) => errors.push("'content' must be an array".to_string()),
    }

    errors
}

/// Validate the structure and decode into a typed [`Template`].
///
/// # Returns
///
/// * `Ok(Template)` - The typed document
/// * `Err(ItsError::Validation)` - Aggregated structural errors
/// * `Err(ItsError::Compilation)` - Decoding failed despite a valid shape
pub fn decode_template(doc: &Value) -> Result<Template> {
    let errors = validate_structure(doc);
    if !errors.is_empty() {
        return Err(ItsError::Validation { errors });
    }

    serde_json::from_value(doc.clone()).map_err(|e| ItsError::Compilation {
        stage: CompileStage::Decoding,
        message: format!("failed to decode template: {}", e),
        element: None,
    })
}

fn validate_elements(elements: &[Value], path: &str, errors: &mut Vec<String>) {
    for (i, element) in elements.iter().enumerate() {
        let element_path = format!("{}[{}]", path, i);
        match element.as_object() {
            Some(object) => validate_element(object, &element_path, errors),
            None => errors.push(format!("{} must be an object", element_path)),
        }
    }
}

fn validate_element(element: &Map<String, Value>, path: &str, errors: &mut Vec<String>) {
    if let Some(id) = element.get("id") {
        if !id.is_string() {
            errors.push(format!("{}.id must be a string", path));
        }
    }

    let element_type = match element.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(_) => {
            errors.push(format!("{}.type must be a string", path));
            return;
        }
        None => {
            errors.push(format!("{} is missing 'type'", path));
            return;
        }
    };

    match element_type {
        "text" => {
            if !matches!(element.get("text"), Some(Value::String(_))) {
                errors.push(format!("{}: text element requires a string 'text'", path));
            }
        }
        "placeholder" => {
            match element.get("instructionType") {
                Some(Value::String(name)) if !name.trim().is_empty() => {}
                _ => errors.push(format!(
                    "{}: placeholder requires a non-empty string 'instructionType'",
                    path
                )),
            }
            match element.get("config") {
                Some(Value::Object(config)) => match config.get("description") {
                    Some(Value::String(_)) => {}
                    Some(_) => errors.push(format!("{}.config.description must be a string", path)),
                    None => errors.push(format!(
                        "{}: placeholder config requires 'description'",
                        path
                    )),
                },
                Some(_) => errors.push(format!("{}.config must be an object", path)),
                None => errors.push(format!("{}: placeholder requires 'config'", path)),
            }
        }
        "conditional" => {
            match element.get("condition") {
                Some(Value::String(c)) if !c.trim().is_empty() => {}
                _ => errors.push(format!(
                    "{}: conditional requires a non-empty string 'condition'",
                    path
                )),
            }
            match element.get("content") {
                Some(Value::Array(children)) => {
                    validate_elements(children, &format!("{}.content", path), errors)
                }
                _ => errors.push(format!("{}: conditional requires a 'content' array", path)),
            }
            match element.get("else") {
                None => {}
                Some(Value::Array(children)) => {
                    validate_elements(children, &format!("{}.else", path), errors)
                }
                Some(_) => errors.push(format!("{}.else must be an array", path)),
            }
        }
        other => errors.push(format!(
            "{}: unknown element type '{}' (expected one of: {})",
            path,
            other,
            ELEMENT_TYPES.join(", ")
        )),
    }
}

fn validate_custom_types(custom: &Value, errors: &mut Vec<String>) {
    let Some(types) = custom.as_object() else {
        errors.push("'customInstructionTypes' must be an object".to_string());
        return;
    };

    for (name, definition) in types {
        let path = format!("customInstructionTypes.{}", name);
        let Some(definition) = definition.as_object() else {
            errors.push(format!("{} must be an object", path));
            continue;
        };
        if !matches!(definition.get("template"), Some(Value::String(_))) {
            errors.push(format!("{} requires a string 'template'", path));
        }
        if let Some(description) = definition.get("description") {
            if !description.is_string() {
                errors.push(format!("{}.description must be a string", path));
            }
        }
        if let Some(schema) = definition.get("configSchema") {
            if !schema.is_object() {
                errors.push(format!("{}.configSchema must be an object", path));
            }
        }
    }
}

fn validate_compiler_config(config: &Value, errors: &mut Vec<String>) {
    let Some(config) = config.as_object() else {
        errors.push("'compilerConfig' must be an object".to_string());
        return;
    };

    for key in COMPILER_CONFIG_STRINGS {
        if let Some(value) = config.get(*key) {
            if !value.is_string() {
                errors.push(format!("compilerConfig.{} must be a string", key));
            }
        }
    }

    if let Some(wrapper) = config.get("instructionWrapper").and_then(Value::as_str) {
        if !wrapper.contains("{instruction}") {
            errors.push(
                "compilerConfig.instructionWrapper must contain '{instruction}'".to_string(),
            );
        }
    }

    if let Some(instructions) = config.get("processingInstructions") {
        match instructions.as_array() {
            Some(items) if items.iter().all(Value::is_string) => {}
            _ => errors.push(
                "compilerConfig.processingInstructions must be an array of strings".to_string(),
            ),
        }
    }
}
