//! `${...}` reference scanner.

use crate::error::VariableResolutionError;

/// A piece of scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any reference.
    Literal(&'a str),
    /// The trimmed path inside `${...}`.
    Reference(&'a str),
}

/// Split `text` into literal and reference segments.
///
/// A `$` not followed by `{` is literal. An unterminated `${` or an empty
/// `${}` is an error rather than literal text.
///
/// # Examples
///
/// ```
/// use its_compiler::variables::{Segment, scan_references};
///
/// let segments = scan_references("Hi ${ name }!").unwrap();
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Literal("Hi "),
///         Segment::Reference("name"),
///         Segment::Literal("!"),
///     ]
/// );
/// ```
pub fn scan_references(text: &str) -> Result<Vec<Segment<'_>>, VariableResolutionError> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find('}') else {
            return Err(VariableResolutionError {
                path: after_open.to_string(),
                reason: "unterminated '${' reference".to_string(),
                available_keys: Vec::new(),
            });
        };

        let path = after_open[..end].trim();
        if path.is_empty() {
            return Err(VariableResolutionError {
                path: String::new(),
                reason: "empty '${}' reference".to_string(),
                available_keys: Vec::new(),
            });
        }

        segments.push(Segment::Reference(path));
        rest = &after_open[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }

    Ok(segments)
}

/// Whether `text` contains anything that looks like a reference.
pub(crate) fn has_references(text: &str) -> bool {
    text.contains("${")
}
