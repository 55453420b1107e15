//! Compilation and validation outputs.

use crate::schema::Override;
use crate::template::Template;
use serde::Serialize;
use serde_json::{Map, Value};

/// The result of a successful compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    /// The assembled prompt.
    pub prompt: String,
    /// The decoded input template, before substitution and pruning.
    pub template: Template,
    /// Template-declared variables merged with caller-supplied ones.
    pub variables: Map<String, Value>,
    pub overrides: Vec<Override>,
    pub warnings: Vec<String>,
    pub compilation_time_ms: f64,
}

/// Read-only diagnostics for a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub security_issues: Vec<String>,
    pub validation_time_ms: f64,
}

impl ValidationReport {
    pub(crate) fn finish(mut self, elapsed_ms: f64) -> Self {
        self.is_valid = self.errors.is_empty() && self.security_issues.is_empty();
        self.validation_time_ms = elapsed_ms;
        self
    }
}
