//! Security validation for untrusted template input.
//!
//! This module implements the trust boundary checks:
//! - Size, element-count and nesting limits, checked before anything deeper
//! - Deny-list scanning of text, conditions and placeholder config
//! - Variable tree vetting (unsafe keys, prototype pollution, array caps)
//! - SSRF guard for schema URLs
//!
//! Deny-lists are defense in depth. The expression grammar and evaluator
//! enforce their own structural restrictions independently.
//!
//! Every check fails closed on the first violation and never mutates input.

mod patterns;
mod url_guard;
mod validator;

#[cfg(test)]
mod tests;

// Re-export public API
pub use patterns::{DenyList, is_unsafe_variable_name};
pub use url_guard::{resolve_url, validate_url};
pub use validator::SecurityValidator;
