//! Typed template document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Wrapper applied to every rendered placeholder instruction.
pub const DEFAULT_INSTRUCTION_WRAPPER: &str = "<<{instruction}>>";

/// Marker convention for user-supplied content inside instructions.
pub const DEFAULT_USER_CONTENT_WRAPPER: &str = "([{<{content}>}])";

/// Introduction used when the template does not provide a system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant that fills in content templates. \
Follow the instructions exactly and replace each placeholder with appropriate content based on \
the user prompts provided. Respond only with the transformed content.";

/// A parsed ITS template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Schema URLs, applied in order (later wins).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    /// Template-declared variables; caller-supplied values override these.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,

    /// Inline instruction types, layered over every extended schema.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_instruction_types: BTreeMap<String, InstructionTypeSpec>,

    pub content: Vec<ContentElement>,

    #[serde(default)]
    pub compiler_config: CompilerConfig,
}

/// One element of a template's content sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentElement {
    /// Literal text, subject to `${...}` interpolation.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
    /// An instruction for the model, rendered from a named instruction type.
    Placeholder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(rename = "instructionType")]
        instruction_type: String,
        /// Must include `description`.
        config: Map<String, Value>,
    },
    /// Content kept or dropped depending on `condition`.
    Conditional {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        condition: String,
        content: Vec<ContentElement>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        else_content: Option<Vec<ContentElement>>,
    },
}

impl ContentElement {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentElement::Text { .. } => "text",
            ContentElement::Placeholder { .. } => "placeholder",
            ContentElement::Conditional { .. } => "conditional",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ContentElement::Text { id, .. }
            | ContentElement::Placeholder { id, .. }
            | ContentElement::Conditional { id, .. } => id.as_deref(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentElement::Text {
            id: None,
            text: text.into(),
        }
    }
}

/// Prompt layout settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_content_wrapper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_wrapper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_instructions: Option<Vec<String>>,
}

impl CompilerConfig {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn instruction_wrapper(&self) -> &str {
        self.instruction_wrapper
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION_WRAPPER)
    }

    pub fn user_content_wrapper(&self) -> &str {
        self.user_content_wrapper
            .as_deref()
            .unwrap_or(DEFAULT_USER_CONTENT_WRAPPER)
    }
}

/// An instruction type as declared in a schema or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionTypeSpec {
    /// Template text with `{key}` slots.
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<Value>,
}

/// An instruction type together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionTypeDefinition {
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<Value>,
    /// Schema URL, or `"custom"` for inline types.
    pub source: String,
}

impl InstructionTypeDefinition {
    pub fn from_spec(spec: InstructionTypeSpec, source: impl Into<String>) -> Self {
        Self {
            template: spec.template,
            description: spec.description,
            config_schema: spec.config_schema,
            source: source.into(),
        }
    }
}
