//! Compiler orchestration.
//!
//! [`Compiler::compile`] runs the full pipeline and fails on the first
//! error; [`Compiler::validate`] collects every problem into a
//! [`ValidationReport`] and never fails.
//!
//! # Example
//!
//! ```
//! use its_compiler::compiler::Compiler;
//! use its_compiler::config::{CompileOptions, SecurityConfig};
//! use serde_json::json;
//!
//! let compiler = Compiler::new(SecurityConfig::default()).unwrap();
//! let template = json!({
//!     "version": "1.0.0",
//!     "variables": { "topic": "x" },
//!     "content": [{ "type": "text", "text": "About ${topic}" }]
//! });
//!
//! let result = compiler.compile(&template, None, &CompileOptions::default()).unwrap();
//! assert!(result.prompt.ends_with("About x"));
//! ```

mod assembly;
mod conditionals;
mod model;
mod pipeline;

#[cfg(test)]
mod tests;

pub use assembly::{default_processing_instructions, render_instruction};
pub use model::{CompilationResult, ValidationReport};
pub use pipeline::Compiler;
