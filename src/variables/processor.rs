//! Variable substitution over template content.

use super::render::{render_condition_literal, render_value};
use super::scanner::{Segment, has_references, scan_references};
use crate::error::VariableResolutionError;
use crate::path::resolve_path;
use crate::template::ContentElement;
use serde_json::{Map, Value};

/// Merge template-declared variables with caller-supplied ones.
///
/// Caller values replace template values by top-level key; nested maps are
/// not merged.
pub fn merge_variables(
    declared: &Map<String, Value>,
    supplied: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut merged = declared.clone();
    if let Some(supplied) = supplied {
        for (key, value) in supplied {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Rewrites `${...}` references against one variable snapshot.
#[derive(Debug, Clone, Copy)]
pub struct VariableProcessor<'a> {
    variables: &'a Map<String, Value>,
}

impl<'a> VariableProcessor<'a> {
    pub fn new(variables: &'a Map<String, Value>) -> Self {
        Self { variables }
    }

    /// Resolve a single path.
    pub fn resolve(&self, path: &str) -> Result<Value, VariableResolutionError> {
        resolve_path(self.variables, path).map_err(|e| e.into_resolution_error(path))
    }

    /// Substitute every reference in `text` with its rendered value.
    ///
    /// # Examples
    ///
    /// ```
    /// use its_compiler::variables::VariableProcessor;
    /// use serde_json::json;
    ///
    /// let vars = json!({ "topic": "cats", "tags": ["a", "b"] });
    /// let processor = VariableProcessor::new(vars.as_object().unwrap());
    ///
    /// let text = processor.process_content("About ${topic}: ${tags}").unwrap();
    /// assert_eq!(text, "About cats: a, b");
    /// ```
    pub fn process_content(&self, text: &str) -> Result<String, VariableResolutionError> {
        self.substitute(text, |_, value| Ok(render_value(value)))
    }

    /// Substitute references in a condition with literal values.
    ///
    /// `${name}` holding `"Bob"` becomes `"Bob"` (quoted), so the result
    /// stays a single literal in the expression grammar.
    pub fn process_condition(&self, condition: &str) -> Result<String, VariableResolutionError> {
        self.substitute(condition, render_condition_literal)
    }

    /// Recursively substitute references inside every string of a value.
    ///
    /// Object keys are left untouched.
    pub fn process_value(&self, value: &Value) -> Result<Value, VariableResolutionError> {
        match value {
            Value::String(s) => Ok(Value::String(self.process_content(s)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.process_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => Ok(Value::Object(self.process_map(map)?)),
            other => Ok(other.clone()),
        }
    }

    /// Substitute references in every value of a map.
    pub fn process_map(
        &self,
        map: &Map<String, Value>,
    ) -> Result<Map<String, Value>, VariableResolutionError> {
        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.process_value(value)?)))
            .collect()
    }

    /// Rewrite every interpolation site in a content sequence.
    ///
    /// Text, placeholder config values and conditions are processed in both
    /// branches of every conditional.
    pub fn process_elements(
        &self,
        elements: &[ContentElement],
    ) -> Result<Vec<ContentElement>, VariableResolutionError> {
        elements
            .iter()
            .map(|element| self.process_element(element))
            .collect()
    }

    fn process_element(
        &self,
        element: &ContentElement,
    ) -> Result<ContentElement, VariableResolutionError> {
        Ok(match element {
            ContentElement::Text { id, text } => ContentElement::Text {
                id: id.clone(),
                text: self.process_content(text)?,
            },
            ContentElement::Placeholder {
                id,
                instruction_type,
                config,
            } => ContentElement::Placeholder {
                id: id.clone(),
                instruction_type: instruction_type.clone(),
                config: self.process_map(config)?,
            },
            ContentElement::Conditional {
                id,
                condition,
                content,
                else_content,
            } => ContentElement::Conditional {
                id: id.clone(),
                condition: self.process_condition(condition)?,
                content: self.process_elements(content)?,
                else_content: else_content
                    .as_ref()
                    .map(|branch| self.process_elements(branch))
                    .transpose()?,
            },
        })
    }

    /// Check every reference in `elements` without rewriting anything.
    ///
    /// Returns one message per distinct unresolvable reference, for
    /// pre-flight diagnostics.
    pub fn validate_variables(&self, elements: &[ContentElement]) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        visit_strings(elements, &mut |text| {
            let segments = match scan_references(text) {
                Ok(segments) => segments,
                Err(e) => {
                    push_unique(&mut errors, e.to_string());
                    return;
                }
            };
            for segment in segments {
                if let Segment::Reference(path) = segment {
                    if seen.iter().any(|p| p == path) {
                        continue;
                    }
                    seen.push(path.to_string());
                    if let Err(e) = self.resolve(path) {
                        errors.push(format!("undefined variable reference '${{{}}}': {}", path, e));
                    }
                }
            }
        });
        errors
    }

    fn substitute<F>(&self, text: &str, render: F) -> Result<String, VariableResolutionError>
    where
        F: Fn(&str, &Value) -> Result<String, VariableResolutionError>,
    {
        if !has_references(text) {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        for segment in scan_references(text)? {
            match segment {
                Segment::Literal(literal) => result.push_str(literal),
                Segment::Reference(path) => {
                    let value = self.resolve(path)?;
                    result.push_str(&render(path, &value)?);
                }
            }
        }
        Ok(result)
    }
}

/// Collect every distinct reference path in `elements`, in first-seen order.
///
/// Malformed references are skipped; [`VariableProcessor::validate_variables`]
/// reports them.
pub fn find_variable_references(elements: &[ContentElement]) -> Vec<String> {
    let mut references = Vec::new();
    visit_strings(elements, &mut |text| {
        if let Ok(segments) = scan_references(text) {
            for segment in segments {
                if let Segment::Reference(path) = segment {
                    push_unique(&mut references, path.to_string());
                }
            }
        }
    });
    references
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Call `visit` on every interpolatable string in `elements`.
fn visit_strings(elements: &[ContentElement], visit: &mut dyn FnMut(&str)) {
    for element in elements {
        match element {
            ContentElement::Text { text, .. } => visit(text),
            ContentElement::Placeholder { config, .. } => {
                for value in config.values() {
                    visit_value_strings(value, visit);
                }
            }
            ContentElement::Conditional {
                condition,
                content,
                else_content,
                ..
            } => {
                visit(condition);
                visit_strings(content, visit);
                if let Some(branch) = else_content {
                    visit_strings(branch, visit);
                }
            }
        }
    }
}

fn visit_value_strings(value: &Value, visit: &mut dyn FnMut(&str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Array(items) => items.iter().for_each(|v| visit_value_strings(v, visit)),
        Value::Object(map) => map.values().for_each(|v| visit_value_strings(v, visit)),
        _ => {}
    }
}
