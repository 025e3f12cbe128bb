//! Serde model of the JSON-Schema keywords this tool reads.
//!
//! Only what lowering needs is modeled; unknown keywords are ignored.
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GenerateError, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[serde(rename = "type")]
    pub type_: Option<TypeNames>,
    #[serde(rename = "$ref")]
    pub ref_: Option<String>,
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<Value>>,

    pub properties: Option<IndexMap<String, SchemaDocument>>,
    pub required: Option<Vec<String>>,

    pub items: Option<Items>,
    pub additional_items: Option<Value>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    #[serde(default)]
    pub unique_items: bool,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<Exclusive>,
    pub exclusive_maximum: Option<Exclusive>,
    pub multiple_of: Option<f64>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    pub definitions: Option<IndexMap<String, SchemaDocument>>,
    #[serde(rename = "$defs")]
    pub defs: Option<IndexMap<String, SchemaDocument>>,
}

/// `"type": "string"` or `"type": ["string", "null"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeNames {
    One(String),
    Many(Vec<String>),
}

/// `items` is either one schema for every element or a tuple of schemas.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    // tried first: a struct would also accept a sequence positionally
    Tuple(Vec<SchemaDocument>),
    Single(Box<SchemaDocument>),
}

/// Draft-4 booleans next to `minimum`/`maximum`, or the draft-6+ numeric form.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Exclusive {
    Flag(bool),
    Bound(f64),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaDocument {
    /// True when the document describes a shape of its own rather than being a
    /// pure container of definitions.
    pub fn is_type(&self) -> bool {
        self.type_.is_some() || self.ref_.is_some() || self.enum_.is_some() || self.properties.is_some()
    }

    /// Child definitions from both `definitions` and `$defs`, in document order.
    ///
    /// A name present in both sections would flatten to the same key, so it is
    /// rejected here.
    pub fn child_definitions(&self, at: &str) -> Result<IndexMap<&str, &SchemaDocument>> {
        let mut out = IndexMap::new();
        let sections = self.definitions.iter().chain(self.defs.iter());
        for section in sections {
            for (name, def) in section {
                if out.insert(name.as_str(), def).is_some() {
                    let key = if at.is_empty() { name.clone() } else { format!("{at}/{name}") };
                    return Err(GenerateError::DuplicateDefinition(key));
                }
            }
        }
        Ok(out)
    }
}

/// Parse a schema document from JSON text, reporting the JSON path of the
/// first offending keyword.
pub fn load_document(src: &str) -> Result<SchemaDocument> {
    let de = &mut serde_json::Deserializer::from_str(src);
    deserialize_with_path(de)
}

pub fn load_document_slice(bytes: &[u8]) -> Result<SchemaDocument> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    deserialize_with_path(de)
}

/// Convert an already-parsed JSON value (e.g. a node picked out by a JSON
/// pointer or a jq filter).
pub fn document_from_value(value: Value) -> Result<SchemaDocument> {
    deserialize_with_path(value)
}

fn deserialize_with_path<'de, D, T>(de: D) -> Result<T>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        GenerateError::Document(format!("at JSON path {path} → {}", err.into_inner()))
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
