//! Command implementations for its.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the security setup both commands share.

mod compile;
mod validate;

use crate::cli::{Command, SecurityArgs};
use its_compiler::error::Result;
use its_compiler::{CompileOptions, Compiler, SecurityConfig};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Compile(args) => compile::cmd_compile(args),
        Command::Validate(args) => validate::cmd_validate(args),
    }
}

/// Resolve the security policy from flags.
///
/// A config file wins over `--dev`; `--allow-http` is applied on top of
/// either.
fn security_config(args: &SecurityArgs) -> Result<SecurityConfig> {
    let mut config = match &args.security_config {
        Some(path) => SecurityConfig::load(path)?,
        None if args.dev => SecurityConfig::development(),
        None => SecurityConfig::default(),
    };
    if args.allow_http {
        config.allow_http = true;
    }
    Ok(config)
}

fn build_compiler(args: &SecurityArgs) -> Result<(Compiler, CompileOptions)> {
    let compiler = Compiler::new(security_config(args)?)?;
    let options = CompileOptions {
        base_url: args.base_url.clone(),
    };
    Ok((compiler, options))
}
