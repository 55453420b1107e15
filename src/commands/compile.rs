//! Implementation of the `its compile` command.

use super::build_compiler;
use crate::cli::CompileArgs;
use its_compiler::error::{ItsError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Execute the `its compile` command.
pub fn cmd_compile(args: CompileArgs) -> Result<()> {
    let (compiler, options) = build_compiler(&args.security)?;

    let variables = args.variables.as_deref().map(load_variables).transpose()?;
    let result = compiler.compile_file(&args.template, variables.as_ref(), &options)?;

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &result.prompt).map_err(|e| {
                ItsError::UserError(format!("failed to write '{}': {}", path.display(), e))
            })?;
            eprintln!(
                "Compiled {} in {:.1}ms -> {}",
                args.template.display(),
                result.compilation_time_ms,
                path.display()
            );
        }
        None => println!("{}", result.prompt),
    }

    Ok(())
}

/// Read a variables file, which must hold a JSON object.
fn load_variables(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).map_err(|e| {
        ItsError::UserError(format!(
            "failed to read variables file '{}': {}",
            path.display(),
            e
        ))
    })?;
    match serde_json::from_str(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ItsError::UserError(format!(
            "variables file '{}' must contain a JSON object",
            path.display()
        ))),
        Err(e) => Err(ItsError::UserError(format!(
            "invalid JSON in variables file '{}': {}",
            path.display(),
            e
        ))),
    }
}
