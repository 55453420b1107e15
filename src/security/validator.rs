//! Whole-document security validation.

use super::patterns::{DenyList, is_unsafe_variable_name};
use super::url_guard::{resolve_url, validate_url};
use crate::config::SecurityConfig;
use crate::error::{Result, SecurityViolation, ViolationKind};
use serde_json::{Map, Value};
use url::Url;

/// Top-level variable keys that indicate a prototype-pollution attempt.
const POLLUTION_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

type Check = std::result::Result<(), SecurityViolation>;

/// Pattern and limit checks over untrusted template input.
///
/// Compile once and reuse; the validator holds no per-template state.
#[derive(Debug)]
pub struct SecurityValidator {
    config: SecurityConfig,
    text_patterns: DenyList,
    expression_patterns: DenyList,
}

impl SecurityValidator {
    /// Build a validator for the given configuration.
    pub fn new(config: SecurityConfig) -> Result<Self> {
        Ok(Self {
            config,
            text_patterns: DenyList::for_text()?,
            expression_patterns: DenyList::for_expressions()?,
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Validate an entire raw template document.
    ///
    /// Checks, in order: serialized size, element count and nesting depth,
    /// text elements, conditions, placeholder config, template variables,
    /// and every `extends` URL. Relative `extends` entries are resolved
    /// against `base_url` before they are checked. Stops at the first
    /// violation.
    pub fn validate_template(&self, doc: &Value, base_url: Option<&str>) -> Check {
        let serialized = serde_json::to_vec(doc).map_err(|e| {
            SecurityViolation::new(
                ViolationKind::InvalidDocument,
                format!("template cannot be serialized: {}", e),
            )
        })?;
        if serialized.len() > self.config.max_template_size {
            return Err(SecurityViolation::new(
                ViolationKind::TemplateTooLarge,
                format!(
                    "template size {} bytes exceeds maximum of {} bytes",
                    serialized.len(),
                    self.config.max_template_size
                ),
            ));
        }

        let Some(root) = doc.as_object() else {
            return Err(SecurityViolation::new(
                ViolationKind::InvalidDocument,
                "template must be a JSON object",
            ));
        };

        if let Some(Value::Array(content)) = root.get("content") {
            let mut count = 0;
            self.check_limits(content, 0, &mut count)?;
            self.check_elements(content)?;
        }

        if let Some(Value::Object(variables)) = root.get("variables") {
            self.validate_variables(variables)?;
        }

        if let Some(Value::Array(extends)) = root.get("extends") {
            for url in extends.iter().filter_map(Value::as_str) {
                self.validate_url(&resolve_url(url, base_url))?;
            }
        }

        Ok(())
    }

    /// Count elements and measure conditional nesting without descending
    /// past either limit.
    fn check_limits(&self, elements: &[Value], depth: usize, count: &mut usize) -> Check {
        for element in elements {
            *count += 1;
            if *count > self.config.max_content_elements {
                return Err(SecurityViolation::new(
                    ViolationKind::TooManyElements,
                    format!(
                        "template has more than {} content elements",
                        self.config.max_content_elements
                    ),
                ));
            }

            if element.get("type").and_then(Value::as_str) != Some("conditional") {
                continue;
            }

            let child_depth = depth + 1;
            for branch in ["content", "else"] {
                if let Some(Value::Array(children)) = element.get(branch) {
                    if !children.is_empty() && child_depth > self.config.max_nesting_depth {
                        return Err(SecurityViolation::new(
                            ViolationKind::NestingTooDeep,
                            format!(
                                "conditional nesting exceeds maximum depth of {}",
                                self.config.max_nesting_depth
                            ),
                        ));
                    }
                    self.check_limits(children, child_depth, count)?;
                }
            }
        }
        Ok(())
    }

    fn check_elements(&self, elements: &[Value]) -> Check {
        for element in elements {
            match element.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = element.get("text").and_then(Value::as_str) {
                        self.validate_text(text)?;
                    }
                }
                Some("placeholder") => {
                    if let Some(config) = element.get("config") {
                        self.check_config_value(config)?;
                    }
                }
                Some("conditional") => {
                    if let Some(condition) = element.get("condition").and_then(Value::as_str) {
                        self.validate_expression(condition)?;
                    }
                    for branch in ["content", "else"] {
                        if let Some(Value::Array(children)) = element.get(branch) {
                            self.check_elements(children)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_config_value(&self, value: &Value) -> Check {
        match value {
            Value::String(s) => self.validate_text(s),
            Value::Array(items) => items.iter().try_for_each(|v| self.check_config_value(v)),
            Value::Object(map) => map.values().try_for_each(|v| self.check_config_value(v)),
            _ => Ok(()),
        }
    }

    /// Scan free text against the text deny-list.
    pub fn validate_text(&self, text: &str) -> Check {
        match self.text_patterns.find_match(text) {
            Some(pattern) => Err(SecurityViolation::new(
                ViolationKind::MaliciousContent,
                format!("content matches blocked pattern '{}'", pattern),
            )
            .with_offending(text)),
            None => Ok(()),
        }
    }

    /// Check a condition's length and scan it against the expression
    /// deny-list.
    pub fn validate_expression(&self, expression: &str) -> Check {
        let length = expression.chars().count();
        if length > self.config.max_expression_length {
            return Err(SecurityViolation::new(
                ViolationKind::ExpressionTooLong,
                format!(
                    "expression length {} exceeds maximum of {}",
                    length, self.config.max_expression_length
                ),
            )
            .with_offending(expression));
        }

        match self.expression_patterns.find_match(expression) {
            Some(pattern) => Err(SecurityViolation::new(
                ViolationKind::MaliciousExpression,
                format!("expression matches blocked pattern '{}'", pattern),
            )
            .with_offending(expression)),
            None => Ok(()),
        }
    }

    /// Vet a variable tree.
    ///
    /// Rejects pollution keys at the top level, unsafe keys at any level,
    /// deny-listed string values, oversized arrays and excessive depth.
    pub fn validate_variables(&self, variables: &Map<String, Value>) -> Check {
        if let Some(key) = variables
            .keys()
            .find(|key| POLLUTION_KEYS.contains(&key.as_str()))
        {
            return Err(SecurityViolation::new(
                ViolationKind::PrototypePollution,
                format!("variables must not define '{}'", key),
            )
            .with_offending(key));
        }

        self.check_variable_map(variables, 0, "variables")
    }

    fn check_variable_map(&self, map: &Map<String, Value>, depth: usize, path: &str) -> Check {
        if depth > self.config.max_nesting_depth {
            return Err(self.variable_depth_violation(path));
        }
        for (key, value) in map {
            let child_path = format!("{}.{}", path, key);
            if is_unsafe_variable_name(key) {
                return Err(SecurityViolation::new(
                    ViolationKind::UnsafeVariableName,
                    format!("unsafe variable name at '{}'", child_path),
                )
                .with_offending(key));
            }
            self.check_variable_value(value, depth + 1, &child_path)?;
        }
        Ok(())
    }

    fn check_variable_value(&self, value: &Value, depth: usize, path: &str) -> Check {
        match value {
            Value::String(s) => self.validate_text(s).map_err(|mut violation| {
                violation.message = format!("{} in '{}'", violation.message, path);
                violation
            }),
            Value::Array(items) => {
                if depth > self.config.max_nesting_depth {
                    return Err(self.variable_depth_violation(path));
                }
                if items.len() > self.config.max_array_length {
                    return Err(SecurityViolation::new(
                        ViolationKind::ArrayTooLarge,
                        format!(
                            "array at '{}' has {} entries, maximum is {}",
                            path,
                            items.len(),
                            self.config.max_array_length
                        ),
                    ));
                }
                items.iter().enumerate().try_for_each(|(i, item)| {
                    self.check_variable_value(item, depth + 1, &format!("{}[{}]", path, i))
                })
            }
            Value::Object(map) => self.check_variable_map(map, depth, path),
            _ => Ok(()),
        }
    }

    fn variable_depth_violation(&self, path: &str) -> SecurityViolation {
        SecurityViolation::new(
            ViolationKind::NestingTooDeep,
            format!(
                "variable nesting at '{}' exceeds maximum depth of {}",
                path, self.config.max_nesting_depth
            ),
        )
    }

    /// Validate a schema URL against the SSRF policy.
    pub fn validate_url(&self, url: &str) -> std::result::Result<Url, SecurityViolation> {
        validate_url(url, &self.config)
    }
}
