//! Path tokenizer.
//!
//! Grammar:
//!
//! ```text
//! path  := name ( '.' name | '[' index ']' )*
//! index := '-'? digits | quoted
//! name  := [A-Za-z0-9_$-]+
//! ```

use super::error::PathError;
use std::fmt;

/// One step of a variable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// `.name` or `['name']`.
    Property(String),
    /// `[n]`; negative values count from the end.
    Index(i64),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Property(name) => write!(f, "property '{}'", name),
            PathStep::Index(index) => write!(f, "index [{}]", index),
        }
    }
}

/// Tokenize a path into ordered steps.
///
/// The first step is always a [`PathStep::Property`] naming a root variable.
///
/// # Examples
///
/// ```
/// use its_compiler::path::{PathStep, parse_path};
///
/// let steps = parse_path("users[-1].name").unwrap();
/// assert_eq!(
///     steps,
///     vec![
///         PathStep::Property("users".to_string()),
///         PathStep::Index(-1),
///         PathStep::Property("name".to_string()),
///     ]
/// );
/// ```
pub fn parse_path(path: &str) -> Result<Vec<PathStep>, PathError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::syntax("empty path"));
    }

    let mut steps = Vec::new();
    let mut chars = path.char_indices().peekable();

    let root = read_name(&mut chars);
    if root.is_empty() {
        return Err(PathError::syntax(format!(
            "'{}' must start with a variable name",
            path
        )));
    }
    steps.push(PathStep::Property(root));

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '.' => {
                let name = read_name(&mut chars);
                if name.is_empty() {
                    return Err(PathError::syntax(format!(
                        "expected property name after '.' at position {} in '{}'",
                        pos, path
                    )));
                }
                steps.push(PathStep::Property(name));
            }
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                let mut quote: Option<char> = None;
                for (_, c) in chars.by_ref() {
                    match (quote, c) {
                        (None, ']') => {
                            closed = true;
                            break;
                        }
                        (None, '\'' | '"') => {
                            quote = Some(c);
                            inner.push(c);
                        }
                        (Some(q), c) if c == q => {
                            quote = None;
                            inner.push(c);
                        }
                        _ => inner.push(c),
                    }
                }
                if !closed {
                    return Err(PathError::syntax(format!(
                        "unmatched '[' at position {} in '{}'",
                        pos, path
                    )));
                }
                steps.push(parse_bracket(inner.trim(), path)?);
            }
            other => {
                return Err(PathError::syntax(format!(
                    "unexpected character '{}' at position {} in '{}'",
                    other, pos, path
                )));
            }
        }
    }

    Ok(steps)
}

fn read_name(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '$' || c == '-' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn parse_bracket(inner: &str, path: &str) -> Result<PathStep, PathError> {
    if inner.is_empty() {
        return Err(PathError::syntax(format!("empty brackets in '{}'", path)));
    }

    for quote in ['\'', '"'] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            let key = &inner[1..inner.len() - 1];
            if key.is_empty() {
                return Err(PathError::syntax(format!("empty quoted key in '{}'", path)));
            }
            return Ok(PathStep::Property(key.to_string()));
        }
    }

    inner.parse::<i64>().map(PathStep::Index).map_err(|_| {
        PathError::syntax(format!(
            "'{}' is not an integer index or quoted key in '{}'",
            inner, path
        ))
    })
}
