//! Instruction-type schemas.
//!
//! This module provides:
//!
//! - **Cache**: TTL store shared across compilations, driven by an injected
//!   [`Clock`]
//! - **Fetcher**: the [`SchemaFetcher`] seam and its HTTP implementation
//! - **Loader**: URL resolution and validation in front of cache and fetch
//! - **Overrides**: the precedence merge of extended and custom types
//!
//! A schema document looks like:
//!
//! ```json
//! {
//!   "instructionTypes": {
//!     "paragraph": {
//!       "template": "Write a paragraph about {description}",
//!       "description": "A single paragraph"
//!     }
//!   }
//! }
//! ```

mod cache;
mod clock;
mod document;
mod fetcher;
mod loader;
mod overrides;


pub use cache::{CacheStats, DEFAULT_SCHEMA_TTL_SECS, SchemaCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::SchemaDocument;
pub use fetcher::{HttpSchemaFetcher, SchemaFetcher};
pub use crate::security::resolve_url;
pub use loader::SchemaLoader;
pub use overrides::{
    CUSTOM_SOURCE, Override, OverrideKind, ResolvedInstructionTypes, resolve_instruction_types,
};
