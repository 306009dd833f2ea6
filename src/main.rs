//! Command-line interface for pie-bnf.
//!
//! Usage:
//!   pie-bnf compile `<schema>`                - Print the grammar of the schema's root record
//!   pie-bnf decode `<schema>` `<payload.json>` - Decode a payload against the root record

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use pie_bnf::schema::SchemaFile;

#[derive(Debug, Parser)]
#[command(name = "pie-bnf", version, about = "Compile record schemas into BNF grammars")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile the root record and print its grammar
    Compile {
        /// Schema file (.toml, or .json)
        schema: PathBuf,
    },
    /// Decode a JSON payload against the root record
    Decode {
        /// Schema file (.toml, or .json)
        schema: PathBuf,
        /// JSON payload to check
        payload: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compile { schema } => compile(&schema),
        Command::Decode { schema, payload } => decode(&schema, &payload),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn compile(schema: &Path) -> Result<()> {
    let file = SchemaFile::load(schema)?;
    let (start, grammar) = file
        .compile()
        .with_context(|| format!("Failed to compile record `{}`", file.root))?;

    info!(root = %file.root, rules = grammar.lines().count(), "compiled");
    println!("start: {start}");
    println!("{grammar}");
    Ok(())
}

fn decode(schema: &Path, payload: &Path) -> Result<()> {
    let file = SchemaFile::load(schema)?;
    let text = fs::read_to_string(payload)
        .with_context(|| format!("Failed to read payload: {payload:?}"))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Payload is not valid JSON: {payload:?}"))?;

    let decoded = file
        .decode(&value)
        .with_context(|| format!("Payload does not match record `{}`", file.root))?;
    println!("{}", serde_json::to_string_pretty(&decoded.to_json())?);
    Ok(())
}
