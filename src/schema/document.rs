//! Schema document shape checks.

use crate::error::{ItsError, Result};
use crate::template::InstructionTypeSpec;
use serde_json::Value;
use std::collections::BTreeMap;

/// A fetched and shape-checked instruction-type schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    /// The resolved URL the schema was loaded from.
    pub url: String,
    pub instruction_types: BTreeMap<String, InstructionTypeSpec>,
}

impl SchemaDocument {
    /// Check and decode a parsed schema body.
    ///
    /// The body must be an object whose `instructionTypes` is an object of
    /// objects, each with a string `template`.
    pub fn from_value(url: &str, body: Value) -> Result<Self> {
        let Value::Object(mut root) = body else {
            return Err(ItsError::schema_load(url, "schema must be a JSON object"));
        };

        let types = match root.remove("instructionTypes") {
            Some(Value::Object(types)) => types,
            Some(_) => {
                return Err(ItsError::schema_load(
                    url,
                    "'instructionTypes' must be an object",
                ));
            }
            None => {
                return Err(ItsError::schema_load(
                    url,
                    "schema has no 'instructionTypes'",
                ));
            }
        };

        let mut instruction_types = BTreeMap::new();
        for (name, definition) in types {
            if !definition.is_object() {
                return Err(ItsError::schema_load(
                    url,
                    format!("instruction type '{}' must be an object", name),
                ));
            }
            if !definition.get("template").is_some_and(Value::is_string) {
                return Err(ItsError::schema_load(
                    url,
                    format!("instruction type '{}' must have a string 'template'", name),
                ));
            }
            let spec: InstructionTypeSpec = serde_json::from_value(definition).map_err(|e| {
                ItsError::schema_load(url, format!("instruction type '{}': {}", name, e))
            })?;
            instruction_types.insert(name, spec);
        }

        Ok(Self {
            url: url.to_string(),
            instruction_types,
        })
    }
}
