//! Step-by-step path walking over a JSON value tree.

use super::error::{PathError, PathErrorKind};
use super::tokenizer::{PathStep, parse_path};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Property names that can never be read through a path.
const UNSAFE_PROPERTIES: &[&str] = &["__proto__", "constructor", "prototype"];

/// Whether `name` may not be accessed, regardless of what the value holds.
pub fn is_unsafe_property(name: &str) -> bool {
    name.starts_with("__") || UNSAFE_PROPERTIES.contains(&name)
}

/// Resolve a textual path against the variable map.
pub fn resolve_path(variables: &Map<String, Value>, path: &str) -> Result<Value, PathError> {
    let steps = parse_path(path)?;
    resolve_steps(variables, &steps)
}

/// Resolve pre-tokenized steps against the variable map.
///
/// The first step must be a property naming a root variable.
pub fn resolve_steps(variables: &Map<String, Value>, steps: &[PathStep]) -> Result<Value, PathError> {
    let (first, rest) = steps
        .split_first()
        .ok_or_else(|| PathError::syntax("empty path"))?;

    let root = match first {
        PathStep::Property(name) => lookup_root(variables, name)?,
        PathStep::Index(_) => {
            return Err(PathError::syntax("path must start with a variable name"));
        }
    };

    let mut current = Cow::Borrowed(root);
    for step in rest {
        current = match current {
            Cow::Borrowed(value) => step_into(value, step)?,
            Cow::Owned(value) => Cow::Owned(step_into(&value, step)?.into_owned()),
        };
    }

    Ok(current.into_owned())
}

fn lookup_root<'a>(variables: &'a Map<String, Value>, name: &str) -> Result<&'a Value, PathError> {
    if is_unsafe_property(name) {
        return Err(PathError::new(PathErrorKind::UnsafeProperty(name.to_string())));
    }
    variables.get(name).ok_or_else(|| {
        PathError::new(PathErrorKind::MissingProperty {
            name: name.to_string(),
            available: variables.keys().cloned().collect(),
        })
    })
}

/// Apply a single step to `current`.
///
/// `length` on an array or string is a virtual step yielding the element or
/// character count. Objects holding a real `length` key return that key.
pub fn step_into<'a>(current: &'a Value, step: &PathStep) -> Result<Cow<'a, Value>, PathError> {
    match step {
        PathStep::Property(name) => {
            if is_unsafe_property(name) {
                return Err(PathError::new(PathErrorKind::UnsafeProperty(name.clone())));
            }
            match current {
                Value::Object(map) => map.get(name).map(Cow::Borrowed).ok_or_else(|| {
                    PathError::new(PathErrorKind::MissingProperty {
                        name: name.clone(),
                        available: map.keys().cloned().collect(),
                    })
                }),
                Value::Array(items) if name == "length" => {
                    Ok(Cow::Owned(Value::from(items.len())))
                }
                Value::String(s) if name == "length" => {
                    Ok(Cow::Owned(Value::from(s.chars().count())))
                }
                other => Err(not_traversable(step, other)),
            }
        }
        PathStep::Index(index) => match current {
            Value::Array(items) => {
                let position = normalize_index(*index, items.len())?;
                Ok(Cow::Borrowed(&items[position]))
            }
            other => Err(not_traversable(step, other)),
        },
    }
}

fn normalize_index(index: i64, len: usize) -> Result<usize, PathError> {
    let out_of_range = || PathError::new(PathErrorKind::IndexOutOfRange { index, len });
    let len_i = i64::try_from(len).map_err(|_| out_of_range())?;
    let normalized = if index < 0 { len_i + index } else { index };
    if (0..len_i).contains(&normalized) {
        usize::try_from(normalized).map_err(|_| out_of_range())
    } else {
        Err(out_of_range())
    }
}

fn not_traversable(step: &PathStep, value: &Value) -> PathError {
    PathError::new(PathErrorKind::NotTraversable {
        step: step.to_string(),
        found: value_kind(value),
    })
}

/// Human-readable kind of a JSON value.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
