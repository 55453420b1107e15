//! Implementation of the `its validate` command.

use super::build_compiler;
use crate::cli::ValidateArgs;
use its_compiler::ValidationReport;
use its_compiler::error::{ItsError, Result};

/// Execute the `its validate` command.
///
/// Prints the report and fails with [`ItsError::ValidationReported`] when
/// the template is not valid.
pub fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let (compiler, options) = build_compiler(&args.security)?;
    let report = compiler.validate_file(&args.template, options.base_url.as_deref())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ItsError::UserError(format!("failed to serialize report: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", render_report(&args.template.display().to_string(), &report));
    }

    outcome(&report)
}

/// Map a printed report to the command result.
fn outcome(report: &ValidationReport) -> Result<()> {
    if report.is_valid {
        Ok(())
    } else {
        Err(ItsError::ValidationReported {
            issues: report.security_issues.len() + report.errors.len(),
        })
    }
}

fn render_report(name: &str, report: &ValidationReport) -> String {
    let mut out = String::new();
    let verdict = if report.is_valid { "valid" } else { "invalid" };
    out.push_str(&format!("{}: {}\n", name, verdict));

    for (label, items) in [
        ("Security issues", &report.security_issues),
        ("Errors", &report.errors),
        ("Warnings", &report.warnings),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", label));
        for item in items {
            out.push_str(&format!("  - {}\n", item));
        }
    }
    out
}
