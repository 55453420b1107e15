//! Prompt assembly from a flattened content sequence.

use crate::error::{CompileStage, ElementContext, ItsError, Result};
use crate::template::{CompilerConfig, ContentElement, InstructionTypeDefinition};
use crate::variables::render_value;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const INSTRUCTION_SLOT: &str = "{instruction}";
const CONTENT_SLOT: &str = "{content}";

/// Build the final prompt.
///
/// Layout: `INTRODUCTION`, the system prompt, numbered `INSTRUCTIONS`, then
/// the `TEMPLATE` body. Body pieces are concatenated without separators.
pub(crate) fn assemble_prompt(
    elements: &[ContentElement],
    instruction_types: &BTreeMap<String, InstructionTypeDefinition>,
    config: &CompilerConfig,
) -> Result<String> {
    let mut body = String::new();
    for (index, element) in elements.iter().enumerate() {
        match element {
            ContentElement::Text { text, .. } => body.push_str(text),
            ContentElement::Placeholder {
                instruction_type,
                config: placeholder_config,
                ..
            } => {
                let definition = instruction_types.get(instruction_type).ok_or_else(|| {
                    assembly_error(
                        index,
                        element,
                        unknown_type_message(instruction_type, instruction_types),
                    )
                })?;
                let instruction = render_instruction(&definition.template, placeholder_config);
                body.push_str(&config.instruction_wrapper().replace(INSTRUCTION_SLOT, &instruction));
            }
            ContentElement::Conditional { .. } => {
                return Err(assembly_error(
                    index,
                    element,
                    "conditional was not resolved before assembly".to_string(),
                ));
            }
        }
    }

    let instructions = config
        .processing_instructions
        .clone()
        .unwrap_or_else(|| default_processing_instructions(config));
    let numbered = instructions
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "INTRODUCTION\n\n{}\n\nINSTRUCTIONS\n\n{}\n\nTEMPLATE\n\n{}",
        config.system_prompt(),
        numbered,
        body
    ))
}

/// Fill `{key}` slots in an instruction-type template.
///
/// `{description}` is replaced first, then every other config key. Slots
/// with no matching key are left as written.
pub fn render_instruction(template: &str, config: &Map<String, Value>) -> String {
    let mut rendered = match config.get("description") {
        Some(description) => template.replace("{description}", &render_value(description)),
        None => template.to_string(),
    };
    for (key, value) in config {
        if key == "description" {
            continue;
        }
        rendered = rendered.replace(&format!("{{{}}}", key), &render_value(value));
    }
    rendered
}

/// The numbered instructions used when the template supplies none.
///
/// They name the configured placeholder and user-content markers.
pub fn default_processing_instructions(config: &CompilerConfig) -> Vec<String> {
    let (instruction_open, instruction_close) =
        split_wrapper(config.instruction_wrapper(), INSTRUCTION_SLOT);
    let (content_open, content_close) = split_wrapper(config.user_content_wrapper(), CONTENT_SLOT);

    vec![
        "Replace each placeholder in the template below with the content it asks for.".to_string(),
        format!(
            "Placeholders start with {} and end with {}.",
            instruction_open, instruction_close
        ),
        format!(
            "Text between {} and {} describes what the user wants generated.",
            content_open, content_close
        ),
        "Keep all text outside the placeholders exactly as written.".to_string(),
        "Do not include the placeholder markers or these instructions in your response."
            .to_string(),
    ]
}

fn split_wrapper<'a>(wrapper: &'a str, slot: &str) -> (&'a str, &'a str) {
    wrapper.split_once(slot).unwrap_or((wrapper, ""))
}

fn unknown_type_message(
    name: &str,
    instruction_types: &BTreeMap<String, InstructionTypeDefinition>,
) -> String {
    if instruction_types.is_empty() {
        format!("unknown instruction type '{}' (no instruction types loaded)", name)
    } else {
        format!(
            "unknown instruction type '{}' (available: {})",
            name,
            instruction_types
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

fn assembly_error(index: usize, element: &ContentElement, message: String) -> ItsError {
    ItsError::Compilation {
        stage: CompileStage::PromptAssembly,
        message,
        element: Some(ElementContext {
            index,
            id: element.id().map(str::to_string),
            element_type: element.type_name(),
        }),
    }
}
