//! Instruction-type precedence merge.

use super::document::SchemaDocument;
use crate::template::{InstructionTypeDefinition, InstructionTypeSpec};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Source id recorded for inline `customInstructionTypes`.
pub const CUSTOM_SOURCE: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideKind {
    /// A later `extends` schema replaced an earlier one.
    SchemaExtension,
    /// An inline custom type replaced a schema type.
    Custom,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::SchemaExtension => "schema-extension",
            OverrideKind::Custom => "custom",
        }
    }
}

/// One instruction-type definition replacing another of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub type_name: String,
    /// Source of the winning definition.
    pub override_source: String,
    /// Source of the definition that was replaced.
    pub overridden_source: String,
    pub kind: OverrideKind,
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instruction type '{}' from {} overrides definition from {} ({})",
            self.type_name,
            self.override_source,
            self.overridden_source,
            self.kind.as_str()
        )
    }
}

/// The merged instruction-type table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInstructionTypes {
    pub types: BTreeMap<String, InstructionTypeDefinition>,
    pub overrides: Vec<Override>,
}

/// Layer schemas in order, then custom types on top.
///
/// Each replacement produces one [`Override`]; the last definition of a name
/// wins.
pub fn resolve_instruction_types<'a, I>(
    schemas: I,
    custom: &BTreeMap<String, InstructionTypeSpec>,
) -> ResolvedInstructionTypes
where
    I: IntoIterator<Item = &'a SchemaDocument>,
{
    let mut resolved = ResolvedInstructionTypes::default();

    for schema in schemas {
        for (name, spec) in &schema.instruction_types {
            layer(
                &mut resolved,
                name,
                InstructionTypeDefinition::from_spec(spec.clone(), schema.url.clone()),
                OverrideKind::SchemaExtension,
            );
        }
    }

    for (name, spec) in custom {
        layer(
            &mut resolved,
            name,
            InstructionTypeDefinition::from_spec(spec.clone(), CUSTOM_SOURCE),
            OverrideKind::Custom,
        );
    }

    resolved
}

fn layer(
    resolved: &mut ResolvedInstructionTypes,
    name: &str,
    definition: InstructionTypeDefinition,
    kind: OverrideKind,
) {
    let new_source = definition.source.clone();
    if let Some(previous) = resolved.types.insert(name.to_string(), definition) {
        let record = Override {
            type_name: name.to_string(),
            override_source: new_source,
            overridden_source: previous.source,
            kind,
        };
        warn!(%record, "instruction type overridden");
        resolved.overrides.push(record);
    }
}
