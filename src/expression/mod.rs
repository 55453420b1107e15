//! Restricted condition language.
//!
//! Conditions are parsed into an [`Expr`] tree and walked by
//! [`ExpressionEvaluator`]. The grammar covers literals (numbers, strings,
//! `true`, `false`, `null`, arrays), variable names, member and index
//! access, comparisons, membership (`in`, `not in`), `&&`/`||`/`!` with the
//! textual aliases `and`/`or`/`not`, and unary `+`/`-`.
//!
//! There is no arithmetic, no assignment and no function call.
//!
//! # Example
//!
//! ```
//! use its_compiler::config::SecurityConfig;
//! use its_compiler::expression::ExpressionEvaluator;
//! use its_compiler::security::SecurityValidator;
//! use serde_json::json;
//!
//! let validator = SecurityValidator::new(SecurityConfig::default()).unwrap();
//! let evaluator = ExpressionEvaluator::new(&validator);
//! let vars = json!({ "count": 5, "tags": ["rust"] });
//!
//! let vars = vars.as_object().unwrap();
//! assert!(evaluator.evaluate("count > 3 and 'rust' in tags", vars).unwrap());
//! ```

mod ast;
mod evaluator;
mod lexer;
mod parser;


pub use ast::{CompareOp, Expr, LogicalOp, UnaryOp};
pub use evaluator::{ExpressionEvaluator, evaluate_ast, is_truthy};
pub use parser::parse_expression;
