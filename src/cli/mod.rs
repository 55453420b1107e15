//! CLI argument parsing for its.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ITS: compile Instruction Template Specification documents into prompts.
#[derive(Parser, Debug)]
#[command(name = "its")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log pipeline stages and cache activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for its.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a template into a prompt.
    ///
    /// Prints the prompt to stdout, or writes it to --output.
    Compile(CompileArgs),

    /// Check a template without compiling it.
    ///
    /// Reports structural errors, unknown instruction types, unresolved
    /// variables, unparseable conditions and security issues.
    Validate(ValidateArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SecurityArgs {
    /// Base URL for relative `extends` entries.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Use the development security preset (HTTP and local hosts allowed).
    #[arg(long)]
    pub dev: bool,

    /// Allow plain HTTP schema URLs.
    #[arg(long)]
    pub allow_http: bool,

    /// Load security settings from a YAML file.
    #[arg(long, value_name = "FILE", conflicts_with = "dev")]
    pub security_config: Option<PathBuf>,
}

/// Arguments for the `compile` command.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Template JSON file.
    pub template: PathBuf,

    /// JSON file of variables overriding the template's own.
    #[arg(long, value_name = "FILE")]
    pub variables: Option<PathBuf>,

    /// Write the prompt here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub security: SecurityArgs,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Template JSON file.
    pub template: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub security: SecurityArgs,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
