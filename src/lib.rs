//! JSON Schema → Go / TypeScript type declarations with runtime validators.
//!
//! ```text
//! schema text ─► SchemaDocument ─► flatten (TypeTable) ─► render (Emitter + Target) ─► source
//! ```
pub mod backend;
pub mod check;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod emit;
pub mod error;
pub mod flatten;
pub mod ir;
pub mod jq_exec;
pub mod lower;
pub mod naming;
pub mod render;
pub mod schema;
pub mod target;
pub mod writer;

use tracing::info;

pub use backend::{GoTarget, TypeScriptTarget};
pub use check::{check_instance, CheckError};
pub use config::{Backend, Config};
pub use error::{GenerateError, Result};
pub use flatten::{flatten, TypeEntry, TypeTable};
pub use schema::{load_document, SchemaDocument};

/// Generate one source unit for `backend` from a parsed schema document.
pub fn generate(doc: &SchemaDocument, config: &Config, backend: Backend) -> Result<String> {
    let table = flatten(doc, config.root_type.as_deref())?;
    let source = render::render(&table, config, backend.target())?;
    info!(%backend, types = table.len(), bytes = source.len(), "generated source");
    Ok(source)
}

/// [`generate`] from JSON schema text.
pub fn generate_from_str(text: &str, config: &Config, backend: Backend) -> Result<String> {
    generate(&load_document(text)?, config, backend)
}
