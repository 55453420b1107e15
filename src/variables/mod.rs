//! Variable interpolation for template content.
//!
//! This module provides:
//!
//! - **Scanner**: locates `${...}` references in a string
//! - **Processor**: rewrites text, placeholder config and conditions with
//!   resolved values
//! - **Render**: turns a resolved value into prompt text
//!
//! # Reference Syntax
//!
//! `${path}` where `path` uses the shared path grammar (see [`crate::path`]):
//!
//! ```text
//! Hello ${user.name}, your last order was ${orders[-1].id}.
//! You have ${orders.length} orders.
//! ```
//!
//! # Error Handling
//!
//! Unresolvable references are errors. The processor never emits an empty
//! string or the literal `${...}` text in place of a missing value.

mod processor;
mod render;
mod scanner;


pub use processor::{VariableProcessor, find_variable_references, merge_variables};
pub use render::{MAX_RENDERED_LENGTH, TRUNCATION_SUFFIX, render_condition_literal, render_value};
pub use scanner::{Segment, scan_references};
