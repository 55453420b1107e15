//! Configuration types and defaults for the ITS compiler.
//!
//! This module defines constants, per-compilation options, and default value
//! functions used by the [`SecurityConfig`](super::SecurityConfig) struct.

/// One mebibyte.
pub const MIB: usize = 1024 * 1024;

/// Default maximum serialized template size.
pub const DEFAULT_MAX_TEMPLATE_SIZE: usize = MIB;

/// Default maximum number of content elements (nested elements included).
pub const DEFAULT_MAX_CONTENT_ELEMENTS: usize = 1000;

/// Default maximum conditional / variable nesting depth.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 10;

/// Default maximum condition length in characters.
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 500;

/// Default maximum entries per array level in the variable tree.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1000;

/// Default maximum schema response body size.
pub const DEFAULT_MAX_SCHEMA_SIZE: usize = 10 * MIB;

/// Default schema request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Request timeout used by the development preset.
pub const DEVELOPMENT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Per-compilation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Base URL that relative `extends` entries are resolved against.
    pub base_url: Option<String>,
}

impl CompileOptions {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_max_template_size() -> usize {
    DEFAULT_MAX_TEMPLATE_SIZE
}

pub(crate) fn default_max_content_elements() -> usize {
    DEFAULT_MAX_CONTENT_ELEMENTS
}

pub(crate) fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

pub(crate) fn default_max_expression_length() -> usize {
    DEFAULT_MAX_EXPRESSION_LENGTH
}

pub(crate) fn default_max_array_length() -> usize {
    DEFAULT_MAX_ARRAY_LENGTH
}

pub(crate) fn default_max_schema_size() -> usize {
    DEFAULT_MAX_SCHEMA_SIZE
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
