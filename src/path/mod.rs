//! Shared variable path resolution.
//!
//! One algorithm serves both `${...}` interpolation and expression member
//! access. A path is tokenized into ordered [`PathStep`]s and walked one
//! step at a time:
//!
//! - `user.name` - property steps
//! - `items[0]`, `items[-1]` - index steps (negative counts from the end)
//! - `user['display name']` - quoted property steps
//! - `items.length` - virtual terminal step on arrays and strings
//!
//! Failures are reported as [`PathError`]; each caller converts it into the
//! error type it raises.

mod error;
mod resolver;
mod tokenizer;


pub use error::{PathError, PathErrorKind};
pub use resolver::{is_unsafe_property, resolve_path, resolve_steps, step_into};
pub(crate) use resolver::value_kind;
pub use tokenizer::{PathStep, parse_path};
