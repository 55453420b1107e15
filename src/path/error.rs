//! Path resolution errors.

use crate::error::{ExpressionError, VariableResolutionError};
use std::fmt;

/// Why a path step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathErrorKind {
    /// The path text could not be tokenized.
    InvalidSyntax(String),
    /// A property was not present on the object.
    MissingProperty {
        name: String,
        available: Vec<String>,
    },
    /// A step was applied to a value that cannot be traversed that way.
    NotTraversable {
        step: String,
        found: &'static str,
    },
    /// An index fell outside `[0, len)` after normalization.
    IndexOutOfRange { index: i64, len: usize },
    /// The property name is on the unsafe list.
    UnsafeProperty(String),
}

/// A failed path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub kind: PathErrorKind,
}

impl PathError {
    pub fn new(kind: PathErrorKind) -> Self {
        Self { kind }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(PathErrorKind::InvalidSyntax(message.into()))
    }

    /// Keys that existed where resolution stopped, for diagnostics.
    pub fn available_keys(&self) -> &[String] {
        match &self.kind {
            PathErrorKind::MissingProperty { available, .. } => available,
            _ => &[],
        }
    }

    /// Convert into the error raised by `${...}` interpolation.
    pub fn into_resolution_error(self, path: &str) -> VariableResolutionError {
        let reason = self.to_string();
        let available_keys = match self.kind {
            PathErrorKind::MissingProperty { available, .. } => available,
            _ => Vec::new(),
        };
        VariableResolutionError {
            path: path.to_string(),
            reason,
            available_keys,
        }
    }

    /// Convert into the error raised by expression evaluation.
    pub fn into_expression_error(self, expression: &str) -> ExpressionError {
        ExpressionError::new(expression, self.to_string())
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PathErrorKind::InvalidSyntax(message) => write!(f, "invalid path: {}", message),
            PathErrorKind::MissingProperty { name, .. } => {
                write!(f, "property '{}' not found", name)
            }
            PathErrorKind::NotTraversable { step, found } => {
                write!(f, "cannot access {} on {}", step, found)
            }
            PathErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for array of length {}", index, len)
            }
            PathErrorKind::UnsafeProperty(name) => {
                write!(f, "access to property '{}' is not allowed", name)
            }
        }
    }
}

impl std::error::Error for PathError {}
