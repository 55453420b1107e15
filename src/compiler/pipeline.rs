//! The compile and validate pipelines.

use super::assembly::assemble_prompt;
use super::conditionals::prune_conditionals;
use super::model::{CompilationResult, ValidationReport};
use crate::config::{CompileOptions, SecurityConfig};
use crate::error::{ItsError, Result};
use crate::expression::{ExpressionEvaluator, parse_expression};
use crate::schema::{SchemaCache, SchemaFetcher, SchemaLoader, resolve_instruction_types};
use crate::security::SecurityValidator;
use crate::template::{ContentElement, InstructionTypeDefinition, decode_template, validate_structure};
use crate::variables::{VariableProcessor, merge_variables};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Compiles ITS templates into prompts.
///
/// A compiler is cheap to share: the schema cache sits behind an `Arc` and
/// can be handed to several compilers.
#[derive(Debug)]
pub struct Compiler {
    validator: SecurityValidator,
    loader: SchemaLoader,
}

impl Compiler {
    /// A compiler with its own schema cache and the HTTP fetcher.
    pub fn new(config: SecurityConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(SchemaCache::new()))
    }

    /// A compiler sharing an existing schema cache.
    pub fn with_cache(config: SecurityConfig, cache: Arc<SchemaCache>) -> Result<Self> {
        config.validate()?;
        let loader = SchemaLoader::new(config.clone(), cache)?;
        Self::from_parts(config, loader)
    }

    /// A compiler with a custom schema transport.
    pub fn with_fetcher(
        config: SecurityConfig,
        cache: Arc<SchemaCache>,
        fetcher: Arc<dyn SchemaFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let loader = SchemaLoader::with_fetcher(config.clone(), cache, fetcher)?;
        Self::from_parts(config, loader)
    }

    fn from_parts(config: SecurityConfig, loader: SchemaLoader) -> Result<Self> {
        Ok(Self {
            validator: SecurityValidator::new(config)?,
            loader,
        })
    }

    pub fn security_config(&self) -> &SecurityConfig {
        self.validator.config()
    }

    pub fn schema_loader(&self) -> &SchemaLoader {
        &self.loader
    }

    /// Compile a template document.
    ///
    /// Stages run in order and the first failure aborts: security
    /// validation, structural validation, variable merge, schema resolution,
    /// substitution, conditional pruning and prompt assembly.
    pub fn compile(
        &self,
        template: &Value,
        variables: Option<&Map<String, Value>>,
        options: &CompileOptions,
    ) -> Result<CompilationResult> {
        let started = Instant::now();

        self.validator
            .validate_template(template, options.base_url.as_deref())?;
        let parsed = decode_template(template)?;

        if let Some(supplied) = variables {
            self.validator.validate_variables(supplied)?;
        }
        let merged = merge_variables(&parsed.variables, variables);

        let schemas = self
            .loader
            .load_all(&parsed.extends, options.base_url.as_deref())?;
        let resolved = resolve_instruction_types(
            schemas.iter().map(|schema| &**schema),
            &parsed.custom_instruction_types,
        );
        debug!(
            schemas = schemas.len(),
            instruction_types = resolved.types.len(),
            "resolved instruction types"
        );

        let substituted = VariableProcessor::new(&merged).process_elements(&parsed.content)?;

        let evaluator = ExpressionEvaluator::new(&self.validator);
        let flattened = prune_conditionals(substituted, &evaluator, &merged)?;

        let prompt = assemble_prompt(&flattened, &resolved.types, &parsed.compiler_config)?;

        let warnings = resolved.overrides.iter().map(ToString::to_string).collect();
        let compilation_time_ms = elapsed_ms(started);
        info!(
            elements = flattened.len(),
            prompt_len = prompt.len(),
            compilation_time_ms,
            "template compiled"
        );

        Ok(CompilationResult {
            prompt,
            template: parsed,
            variables: merged,
            overrides: resolved.overrides,
            warnings,
            compilation_time_ms,
        })
    }

    /// Compile a template from JSON text.
    pub fn compile_str(
        &self,
        json: &str,
        variables: Option<&Map<String, Value>>,
        options: &CompileOptions,
    ) -> Result<CompilationResult> {
        let template = parse_json(json, "template")?;
        self.compile(&template, variables, options)
    }

    /// Compile a template file.
    pub fn compile_file<P: AsRef<Path>>(
        &self,
        path: P,
        variables: Option<&Map<String, Value>>,
        options: &CompileOptions,
    ) -> Result<CompilationResult> {
        let template = read_json_file(path.as_ref())?;
        self.compile(&template, variables, options)
    }

    /// Report every problem with a template without compiling it.
    ///
    /// Security violations are reported as issues rather than returned as
    /// errors. Structural errors, unknown instruction types, unresolvable
    /// `${...}` references and unparseable conditions are all collected.
    pub fn validate(&self, template: &Value, base_url: Option<&str>) -> ValidationReport {
        let started = Instant::now();
        let mut report = ValidationReport::default();

        if let Err(violation) = self.validator.validate_template(template, base_url) {
            report.security_issues.push(violation.to_string());
        }

        report.errors.extend(validate_structure(template));
        if !report.errors.is_empty() {
            return report.finish(elapsed_ms(started));
        }

        let parsed = match decode_template(template) {
            Ok(parsed) => parsed,
            Err(e) => {
                report.errors.push(e.to_string());
                return report.finish(elapsed_ms(started));
            }
        };

        let mut schemas = Vec::new();
        let mut schemas_complete = true;
        for url in &parsed.extends {
            match self.loader.load_schema(url, base_url) {
                Ok(schema) => schemas.push(schema),
                Err(ItsError::Security(violation)) => {
                    schemas_complete = false;
                    report.security_issues.push(violation.to_string());
                }
                Err(e) => {
                    schemas_complete = false;
                    report.errors.push(e.to_string());
                }
            }
        }

        let resolved = resolve_instruction_types(
            schemas.iter().map(|schema| &**schema),
            &parsed.custom_instruction_types,
        );
        report
            .warnings
            .extend(resolved.overrides.iter().map(ToString::to_string));

        // With a schema missing, every type it would have defined looks
        // unknown; only report unknown types against the full table.
        if schemas_complete {
            check_instruction_types(&parsed.content, "content", &resolved.types, &mut report);
        }

        let processor = VariableProcessor::new(&parsed.variables);
        report
            .errors
            .extend(processor.validate_variables(&parsed.content));
        check_conditions(&parsed.content, "content", &processor, &mut report);

        report.finish(elapsed_ms(started))
    }

    /// Validate a template file. Unreadable or non-JSON files are errors.
    pub fn validate_file<P: AsRef<Path>>(
        &self,
        path: P,
        base_url: Option<&str>,
    ) -> Result<ValidationReport> {
        let template = read_json_file(path.as_ref())?;
        Ok(self.validate(&template, base_url))
    }
}

fn check_instruction_types(
    elements: &[ContentElement],
    path: &str,
    types: &BTreeMap<String, InstructionTypeDefinition>,
    report: &mut ValidationReport,
) {
    for (i, element) in elements.iter().enumerate() {
        let element_path = format!("{}[{}]", path, i);
        match element {
            ContentElement::Placeholder {
                instruction_type, ..
            } if !types.contains_key(instruction_type) => {
                report.errors.push(format!(
                    "{}: unknown instruction type '{}'",
                    element_path, instruction_type
                ));
            }
            ContentElement::Conditional {
                content,
                else_content,
                ..
            } => {
                check_instruction_types(
                    content,
                    &format!("{}.content", element_path),
                    types,
                    report,
                );
                if let Some(branch) = else_content {
                    check_instruction_types(
                        branch,
                        &format!("{}.else", element_path),
                        types,
                        report,
                    );
                }
            }
            _ => {}
        }
    }
}

fn check_conditions(
    elements: &[ContentElement],
    path: &str,
    processor: &VariableProcessor<'_>,
    report: &mut ValidationReport,
) {
    for (i, element) in elements.iter().enumerate() {
        let ContentElement::Conditional {
            condition,
            content,
            else_content,
            ..
        } = element
        else {
            continue;
        };
        let element_path = format!("{}[{}]", path, i);

        // Unresolvable references are already reported by the variable pass.
        if let Ok(substituted) = processor.process_condition(condition) {
            if let Err(e) = parse_expression(&substituted) {
                report
                    .errors
                    .push(format!("{}.condition: {}", element_path, e));
            }
        }

        check_conditions(content, &format!("{}.content", element_path), processor, report);
        if let Some(branch) = else_content {
            check_conditions(branch, &format!("{}.else", element_path), processor, report);
        }
    }
}

fn parse_json(json: &str, what: &str) -> Result<Value> {
    serde_json::from_str(json)
        .map_err(|e| ItsError::UserError(format!("invalid {} JSON: {}", what, e)))
}

fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ItsError::UserError(format!("failed to read '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ItsError::UserError(format!("invalid JSON in '{}': {}", path.display(), e))
    })
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
