//! The ITS template document model.
//!
//! This module provides:
//!
//! - **Model**: typed serde representation of a template document
//! - **Structure**: aggregated structural validation of the raw JSON shape
//!
//! # Document shape
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "extends": ["https://example.com/schemas/standard.json"],
//!   "variables": { "topic": "cats" },
//!   "content": [
//!     { "type": "text", "text": "About ${topic}\n" },
//!     { "type": "placeholder", "instructionType": "paragraph",
//!       "config": { "description": "an introduction" } },
//!     { "type": "conditional", "condition": "detailed == true",
//!       "content": [ ... ], "else": [ ... ] }
//!   ]
//! }
//! ```

mod model;
mod structure;


pub use model::{
    CompilerConfig, ContentElement, DEFAULT_INSTRUCTION_WRAPPER, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_USER_CONTENT_WRAPPER, InstructionTypeDefinition, InstructionTypeSpec, Template,
};
pub use structure::{decode_template, validate_structure};
