//! CLI: schema → (go | typescript) source, or check sample payloads against a schema.
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{Backend, Config};
use crate::schema::{document_from_value, SchemaDocument};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate constraint-checked Go or TypeScript types from a JSON schema
#[derive(Parser, Debug)]
#[command(name = "schema-codegen", version)]
pub struct CommandLineInterface {
    /// log progress to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit a Go package
    Go(GoOut),
    /// emit a TypeScript module
    Typescript(TypeScriptOut),
    /// check JSON instances against a type of the schema
    Check(CheckIn),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the schema node inside the input (e.g. /components/schemas)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq filter selecting the schema node; must yield exactly one value
    #[arg(long)]
    jq_expr: Option<String>,

    /// schema file, or '-' for stdin
    #[arg(long, short)]
    input: String,
}

#[derive(Args, Debug, Clone)]
struct GenerateSettings {
    #[command(flatten)]
    input_settings: InputSettings,

    /// type name for a schema whose top level is itself a type
    #[arg(long)]
    root_type: Option<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct GoOut {
    #[command(flatten)]
    settings: GenerateSettings,

    /// Go import path; its last segment becomes the package clause
    #[arg(long, default_value = "schema")]
    package: String,
}

#[derive(clap::Parser, Debug)]
struct TypeScriptOut {
    #[command(flatten)]
    settings: GenerateSettings,

    /// module name recorded in the file header
    #[arg(long, default_value = "schema")]
    module: String,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    #[command(flatten)]
    input_settings: InputSettings,

    /// type name for a schema whose top level is itself a type
    #[arg(long)]
    root_type: Option<String>,

    /// type to check against: a definition name (`outer/inner`) or identifier (`OuterInner`)
    #[arg(long = "type")]
    type_name: String,

    /// instance files or quoted glob patterns
    #[arg(long, num_args = 1.., required = true)]
    instance: Vec<String>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_value(&self) -> Result<Value> {
        let source = if self.input == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read schema from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.input)
                .with_context(|| format!("failed to read schema file ({})", self.input))?
        };
        let mut value = serde_json::from_str::<Value>(&source)
            .with_context(|| format!("failed to parse JSON schema file ({})", self.input))?;

        if let Some(pointer) = self.json_pointer.as_ref() {
            value = value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer {pointer} selects nothing in {}", self.input))?;
        }
        if let Some(jq_expr) = self.jq_expr.as_ref() {
            let mut outputs = crate::jq_exec::run_jaq(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to {}", self.input))?;
            if outputs.len() != 1 {
                bail!("jq expression must yield exactly one schema document, got {}", outputs.len());
            }
            value = outputs.remove(0);
        }
        Ok(value)
    }

    fn load_document(&self) -> Result<SchemaDocument> {
        let value = self.load_value()?;
        let doc = document_from_value(value).with_context(|| format!("invalid schema ({})", self.input))?;
        Ok(doc)
    }
}

impl GenerateSettings {
    fn run(&self, backend: Backend, output_module: &str) -> Result<()> {
        let doc = self.input_settings.load_document()?;
        let config = Config { root_type: self.root_type.clone(), output_module: output_module.to_string() };
        let source = crate::generate(&doc, &config, backend)?;
        write_output(self.out.as_deref(), &source)
    }
}

impl CheckIn {
    fn run(&self) -> Result<()> {
        let doc = self.input_settings.load_document()?;
        let table = crate::flatten(&doc, self.root_type.as_deref())?;
        let paths = resolve_file_path_patterns(&self.instance)?;

        let outcomes = paths
            .par_iter()
            .map(|path| (path, check_file(&table, &self.type_name, path)))
            .collect::<Vec<_>>();

        let mut failed = 0usize;
        for (path, outcome) in &outcomes {
            let path = path.to_string_lossy();
            match outcome {
                Ok(()) => println!("{} {path}", "ok".green().bold()),
                Err(error) => {
                    failed += 1;
                    println!("{} {path}: {error:#}", "FAIL".red().bold());
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} instances failed {}", outcomes.len(), self.type_name);
        }
        Ok(())
    }
}

fn check_file(table: &crate::TypeTable, type_name: &str, path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read instance file ({})", path.display()))?;
    let value = serde_json::from_str::<Value>(&source).context("instance is not valid JSON")?;
    crate::check_instance(table, type_name, &value)?;
    Ok(())
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let filter = match self.verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        };
        // stdout carries generated source
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub fn run(&self) -> Result<()> {
        debug!(cmd = ?self.cmd, "parsed arguments");
        match &self.cmd {
            Command::Go(target) => {
                // debug path
                if target.settings.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.settings.run(Backend::Go, &target.package)
            }
            Command::Typescript(target) => {
                if target.settings.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.settings.run(Backend::TypeScript, &target.module)
            }
            Command::Check(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, source: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, source).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            print!("{source}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
