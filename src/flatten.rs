//! Definition flattening: the compiler's symbol table.
//!
//! Every definition, however deeply nested, gets one `/`-joined name. The
//! table is built once per run and read-only afterwards.
use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{GenerateError, Result};
use crate::ir::TypeNode;
use crate::lower::lower_to_ir;
use crate::naming::{render_name, render_path};
use crate::schema::SchemaDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Definition path segments; empty for the root type.
    pub path: Vec<String>,
    pub node: TypeNode,
    /// Rendered target-language identifier.
    pub ident: String,
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: BTreeMap<String, TypeEntry>,
    idents: BTreeMap<String, String>, // ident -> name, guards rendered collisions
    root: Option<String>,
}

impl TypeTable {
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    /// Entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root.as_deref()
    }

    fn insert(&mut self, name: String, entry: TypeEntry) -> Result<()> {
        if self.entries.contains_key(&name) {
            return Err(GenerateError::DuplicateDefinition(name));
        }
        if let Some(other) = self.idents.get(&entry.ident) {
            return Err(GenerateError::DuplicateDefinition(format!(
                "{name} (renders to {} like {other})",
                entry.ident
            )));
        }
        debug!(name = %name, ident = %entry.ident, kind = entry.node.kind(), "flattened definition");
        self.idents.insert(entry.ident.clone(), name.clone());
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Resolve a local `$ref` pointer to its table entry.
    ///
    /// Accepted forms: `#` (the root type) and
    /// `#/<container>/<name>[/<container>/<name>...]` where every container
    /// token is `definitions` or `$defs`. Name segments are JSON-pointer
    /// unescaped (`~1` → `/`, `~0` → `~`).
    pub fn resolve(&self, pointer: &str) -> Result<&TypeEntry> {
        let mut parts = pointer.split('/');
        if parts.next() != Some("#") {
            return Err(GenerateError::unsupported(pointer, "only local $ref is support"));
        }
        let rest = parts.collect::<Vec<_>>();
        if rest.is_empty() {
            return self
                .root
                .as_deref()
                .and_then(|root| self.entries.get(root))
                .ok_or_else(|| GenerateError::UnresolvedReference(pointer.to_string()));
        }
        if rest.len() % 2 != 0 {
            return Err(GenerateError::MalformedReference(pointer.to_string()));
        }
        let mut names = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks(2) {
            if pair[0] != "definitions" && pair[0] != "$defs" {
                return Err(GenerateError::MalformedReference(pointer.to_string()));
            }
            names.push(unescape_pointer_token(pair[1]));
        }
        let name = names.join("/");
        self.entries
            .get(&name)
            .ok_or_else(|| GenerateError::UnresolvedReference(pointer.to_string()))
    }
}

fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Build the flattened type table for a document.
///
/// When the document is itself a type it is registered under `root_type`
/// first; definitions follow depth-first, parents before children.
pub fn flatten(doc: &SchemaDocument, root_type: Option<&str>) -> Result<TypeTable> {
    let mut table = TypeTable::default();

    if doc.is_type() {
        let root_name = root_type.ok_or(GenerateError::MissingRootName)?;
        let entry = TypeEntry {
            path: Vec::new(),
            node: lower_to_ir(doc, "#")?,
            ident: render_name(root_name),
        };
        table.insert(root_name.to_string(), entry)?;
        table.root = Some(root_name.to_string());
    } else if let Some(root_name) = root_type {
        debug!(root = root_name, "document is a pure definitions container; root-type name unused");
    }

    walk_definitions(&mut table, &[], &doc.child_definitions("")?)?;
    Ok(table)
}

fn walk_definitions(
    table: &mut TypeTable,
    base: &[String],
    defs: &IndexMap<&str, &SchemaDocument>,
) -> Result<()> {
    for (key, def) in defs {
        let mut path = base.to_vec();
        path.push(key.to_string());
        let name = path.join("/");
        let at = path.iter().fold(String::from("#"), |acc, p| format!("{acc}/definitions/{p}"));
        let entry = TypeEntry {
            node: lower_to_ir(def, &at)?,
            ident: render_path(&path),
            path: path.clone(),
        };
        table.insert(name.clone(), entry)?;
        walk_definitions(table, &path, &def.child_definitions(&name)?)?;
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
