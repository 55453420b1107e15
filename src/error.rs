//! Error types for the ITS compiler.
//!
//! Uses thiserror for derive macros. Every failure the core can produce is a
//! variant of [`ItsError`]; presentation is left to the caller.

use crate::exit_codes;
use std::fmt;
use thiserror::Error;

/// Maximum number of characters of an offending value carried in an error.
pub const MAX_OFFENDING_VALUE_CHARS: usize = 100;

/// Category of a security violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Serialized template exceeds `max_template_size`.
    TemplateTooLarge,
    /// More content elements than `max_content_elements`.
    TooManyElements,
    /// Conditional or variable nesting deeper than `max_nesting_depth`.
    NestingTooDeep,
    /// Text or config value matched the deny-list.
    MaliciousContent,
    /// Condition longer than `max_expression_length`.
    ExpressionTooLong,
    /// Condition matched the expression deny-list.
    MaliciousExpression,
    /// Variables object carries `__proto__`, `constructor` or `prototype`.
    PrototypePollution,
    /// A variable key is in the unsafe-name set.
    UnsafeVariableName,
    /// A variable array exceeds `max_array_length`.
    ArrayTooLarge,
    /// A schema URL failed the SSRF guard.
    UrlRejected,
    /// The document is not shaped the way the validator can inspect.
    InvalidDocument,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TemplateTooLarge => "template_too_large",
            ViolationKind::TooManyElements => "too_many_elements",
            ViolationKind::NestingTooDeep => "nesting_too_deep",
            ViolationKind::MaliciousContent => "malicious_content",
            ViolationKind::ExpressionTooLong => "expression_too_long",
            ViolationKind::MaliciousExpression => "malicious_expression",
            ViolationKind::PrototypePollution => "prototype_pollution",
            ViolationKind::UnsafeVariableName => "unsafe_variable_name",
            ViolationKind::ArrayTooLarge => "array_too_large",
            ViolationKind::UrlRejected => "url_rejected",
            ViolationKind::InvalidDocument => "invalid_document",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single security violation. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityViolation {
    pub kind: ViolationKind,
    pub message: String,
    /// The offending value, truncated to [`MAX_OFFENDING_VALUE_CHARS`].
    pub offending: Option<String>,
}

impl SecurityViolation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offending: None,
        }
    }

    /// Attach the offending value, truncating it for display.
    pub fn with_offending(mut self, value: &str) -> Self {
        self.offending = Some(truncate_chars(value, MAX_OFFENDING_VALUE_CHARS));
        self
    }
}

impl fmt::Display for SecurityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)?;
        if let Some(value) = &self.offending {
            write!(f, ": '{}'", value)?;
        }
        Ok(())
    }
}

/// A `${...}` reference or expression path that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve variable '{path}': {reason}{}", format_available(.available_keys))]
pub struct VariableResolutionError {
    /// The path exactly as written in the template.
    pub path: String,
    pub reason: String,
    /// Keys that existed at the point resolution failed, when known.
    pub available_keys: Vec<String>,
}

fn format_available(keys: &[String]) -> String {
    if keys.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", keys.join(", "))
    }
}

fn format_element(element: &Option<ElementContext>) -> String {
    match element {
        Some(element) => format!(" at {}", element),
        None => String::new(),
    }
}

/// A condition that failed to parse or evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to evaluate expression '{expression}': {reason}")]
pub struct ExpressionError {
    pub expression: String,
    pub reason: String,
}

impl ExpressionError {
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Pipeline stage a compilation failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStage {
    Decoding,
    SchemaResolution,
    VariableSubstitution,
    ConditionalEvaluation,
    PromptAssembly,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileStage::Decoding => "decoding",
            CompileStage::SchemaResolution => "schema resolution",
            CompileStage::VariableSubstitution => "variable substitution",
            CompileStage::ConditionalEvaluation => "conditional evaluation",
            CompileStage::PromptAssembly => "prompt assembly",
        };
        f.write_str(name)
    }
}

/// Identifies the content element a compilation failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementContext {
    /// Position in the (flattened, at assembly time) content sequence.
    pub index: usize,
    pub id: Option<String>,
    pub element_type: &'static str,
}

impl fmt::Display for ElementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} element #{}", self.element_type, self.index)?;
        if let Some(id) = &self.id {
            write!(f, " (id '{}')", id)?;
        }
        Ok(())
    }
}

/// Main error type for ITS compiler operations.
#[derive(Error, Debug)]
pub enum ItsError {
    /// Size, nesting, malicious pattern, SSRF or prototype-pollution violation.
    #[error("Security violation: {0}")]
    Security(SecurityViolation),

    /// Structural or variable-reference problems, aggregated.
    #[error("Template validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    /// A pipeline stage failed.
    #[error("Compilation failed during {stage}{}: {message}", format_element(.element))]
    Compilation {
        stage: CompileStage,
        message: String,
        element: Option<ElementContext>,
    },

    #[error(transparent)]
    VariableResolution(#[from] VariableResolutionError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A schema could not be fetched, parsed or accepted.
    #[error("Failed to load schema '{url}': {reason}")]
    SchemaLoad { url: String, reason: String },

    /// Bad arguments, unreadable files, invalid configuration.
    #[error("{0}")]
    UserError(String),

    /// Validation failed and the full report has already been shown.
    #[error("Template validation failed with {issues} issue(s)")]
    ValidationReported { issues: usize },
}

impl From<SecurityViolation> for ItsError {
    fn from(violation: SecurityViolation) -> Self {
        ItsError::Security(violation)
    }
}

impl ItsError {
    pub fn schema_load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ItsError::SchemaLoad {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ItsError::UserError(_) => exit_codes::USER_ERROR,
            ItsError::Validation { .. } | ItsError::ValidationReported { .. } => {
                exit_codes::VALIDATION_FAILURE
            }
            ItsError::Security(_) => exit_codes::SECURITY_VIOLATION,
            ItsError::Compilation { .. }
            | ItsError::VariableResolution(_)
            | ItsError::Expression(_)
            | ItsError::SchemaLoad { .. } => exit_codes::COMPILATION_FAILURE,
        }
    }

    /// Whether the failure was already presented to the user.
    pub fn is_reported(&self) -> bool {
        matches!(self, ItsError::ValidationReported { .. })
    }

    /// The violation, if this is a security error.
    pub fn as_security(&self) -> Option<&SecurityViolation> {
        match self {
            ItsError::Security(violation) => Some(violation),
            _ => None,
        }
    }
}

/// Result type alias for ITS compiler operations.
pub type Result<T> = std::result::Result<T, ItsError>;

/// Truncate to at most `max` characters, appending `...` when shortened.
pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &value[..byte_idx]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_error_has_correct_exit_code() {
        let err = ItsError::from(SecurityViolation::new(
            ViolationKind::MaliciousContent,
            "script tag",
        ));
        assert_eq!(err.exit_code(), exit_codes::SECURITY_VIOLATION);
    }

    #[test]
    fn test_validation_error_has_correct_exit_code() {
        let err = ItsError::Validation {
            errors: vec!["missing version".to_string()],
        };
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_resolution_and_expression_errors_are_compilation_failures() {
        let err = ItsError::from(VariableResolutionError {
            path: "user.name".to_string(),
            reason: "property 'name' not found".to_string(),
            available_keys: vec![],
        });
        assert_eq!(err.exit_code(), exit_codes::COMPILATION_FAILURE);

        let err = ItsError::from(ExpressionError::new("a >", "unexpected end of expression"));
        assert_eq!(err.exit_code(), exit_codes::COMPILATION_FAILURE);
    }

    #[test]
    fn test_reported_validation_keeps_exit_code() {
        let err = ItsError::ValidationReported { issues: 3 };
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_FAILURE);
        assert!(err.is_reported());
        assert!(!ItsError::UserError("x".to_string()).is_reported());
    }

    #[test]
    fn test_user_error_has_correct_exit_code() {
        let err = ItsError::UserError("file not found".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn test_offending_value_is_truncated() {
        let long = "x".repeat(250);
        let violation =
            SecurityViolation::new(ViolationKind::MaliciousContent, "bad").with_offending(&long);
        let offending = violation.offending.unwrap();
        assert_eq!(offending.chars().count(), MAX_OFFENDING_VALUE_CHARS + 3);
        assert!(offending.ends_with("..."));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = ItsError::from(VariableResolutionError {
            path: "user.age".to_string(),
            reason: "property 'age' not found".to_string(),
            available_keys: vec!["name".to_string(), "email".to_string()],
        });
        assert_eq!(
            err.to_string(),
            "cannot resolve variable 'user.age': property 'age' not found (available: name, email)"
        );

        let err = ItsError::Compilation {
            stage: CompileStage::PromptAssembly,
            message: "unknown instruction type 'poem'".to_string(),
            element: Some(ElementContext {
                index: 2,
                id: Some("intro".to_string()),
                element_type: "placeholder",
            }),
        };
        assert_eq!(
            err.to_string(),
            "Compilation failed during prompt assembly at placeholder element #2 (id 'intro'): unknown instruction type 'poem'"
        );
    }
}
