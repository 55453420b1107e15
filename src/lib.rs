//! ITS compiler: turns Instruction Template Specification documents into
//! prompts for a language model.
//!
//! A template is a JSON document of text, placeholder and conditional
//! elements. Compilation validates it against the security policy, loads
//! the instruction-type schemas it extends, substitutes `${...}`
//! references, prunes conditionals and assembles the prompt.
//!
//! ```
//! use its_compiler::{Compiler, CompileOptions, SecurityConfig};
//! use serde_json::json;
//!
//! let compiler = Compiler::new(SecurityConfig::default()).unwrap();
//! let template = json!({
//!     "version": "1.0.0",
//!     "customInstructionTypes": {
//!         "summary": { "template": "Summarize {description}" }
//!     },
//!     "content": [
//!         { "type": "text", "text": "Notes:\n" },
//!         { "type": "placeholder", "instructionType": "summary",
//!           "config": { "description": "the meeting" } }
//!     ]
//! });
//!
//! let result = compiler.compile(&template, None, &CompileOptions::default()).unwrap();
//! assert!(result.prompt.ends_with("Notes:\n<<Summarize the meeting>>"));
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod expression;
pub mod path;
pub mod schema;
pub mod security;
pub mod template;
pub mod variables;

pub use compiler::{CompilationResult, Compiler, ValidationReport};
pub use config::{CompileOptions, SecurityConfig};
pub use error::{ItsError, Result};
