//! Configuration model for the ITS compiler.
//!
//! [`SecurityConfig`] carries every limit and URL policy the trust boundary
//! enforces. It has a strict default and a permissive [`development`]
//! preset, and can be loaded from YAML (unknown fields are ignored).
//!
//! [`development`]: SecurityConfig::development

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::SecurityConfig;
pub use types::CompileOptions;
