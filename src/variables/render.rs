//! Rendering of resolved values into prompt text.

use crate::error::VariableResolutionError;
use serde_json::Value;

/// Longest rendered non-string value before truncation.
pub const MAX_RENDERED_LENGTH: usize = 1000;

/// Appended to values cut at [`MAX_RENDERED_LENGTH`].
pub const TRUNCATION_SUFFIX: &str = "...[TRUNCATED]";

/// Render a value for interpolation into text.
///
/// - strings pass through verbatim
/// - arrays join their rendered elements with `", "`
/// - objects become `[Object with N properties]`; structure is never dumped
/// - other scalars use their JSON spelling (`true`, `42`, `null`)
///
/// Everything but strings is truncated at [`MAX_RENDERED_LENGTH`] characters.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => truncate(render_inner(other)),
    }
}

fn render_inner(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_inner)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => format!("[Object with {} properties]", map.len()),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

fn truncate(rendered: String) -> String {
    match rendered.char_indices().nth(MAX_RENDERED_LENGTH) {
        Some((byte_idx, _)) => format!("{}{}", &rendered[..byte_idx], TRUNCATION_SUFFIX),
        None => rendered,
    }
}

/// Render a value as a literal for substitution into a condition.
///
/// Strings are quoted and escaped so a substituted value can never alter the
/// expression's structure. Objects have no literal form and are rejected, as
/// are control characters that only have a `\u` escape.
pub fn render_condition_literal(
    path: &str,
    value: &Value,
) -> Result<String, VariableResolutionError> {
    if contains_object(value) {
        return Err(VariableResolutionError {
            path: path.to_string(),
            reason: "objects cannot be interpolated into a condition".to_string(),
            available_keys: Vec::new(),
        });
    }
    if let Some(c) = find_unicode_escaped_char(value) {
        return Err(VariableResolutionError {
            path: path.to_string(),
            reason: format!(
                "control character U+{:04X} cannot be interpolated into a condition",
                c as u32
            ),
            available_keys: Vec::new(),
        });
    }
    serde_json::to_string(value).map_err(|e| VariableResolutionError {
        path: path.to_string(),
        reason: format!("cannot render value as a literal: {}", e),
        available_keys: Vec::new(),
    })
}

/// First character `serde_json` would write as `\u00XX`.
fn find_unicode_escaped_char(value: &Value) -> Option<char> {
    match value {
        Value::String(s) => s.chars().find(|&c| {
            c < ' ' && !matches!(c, '\u{8}' | '\t' | '\n' | '\u{c}' | '\r')
        }),
        Value::Array(items) => items.iter().find_map(find_unicode_escaped_char),
        _ => None,
    }
}

fn contains_object(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(contains_object),
        _ => false,
    }
}
