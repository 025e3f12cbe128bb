//! Generation-time failures.
//!
//! Every variant aborts the whole run: there is no partial output. The
//! generated code's own runtime failures are a separate taxonomy (see
//! `emit::checks`).
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The schema document could not be deserialized.
    #[error("failed to read schema document: {0}")]
    Document(String),

    /// Two definitions flatten to the same name or render to the same identifier.
    #[error("duplicate name {0}")]
    DuplicateDefinition(String),

    /// The document is itself a type but no root-type name was supplied.
    #[error("need a root-type name: the schema document declares a top-level type")]
    MissingRootName,

    /// Multi-type unions, tuple arrays, non-string enums, non-local references.
    #[error("unsupported schema shape at {at}: {reason}")]
    UnsupportedShape { at: String, reason: String },

    /// A local `$ref` whose container segments are not `definitions`/`$defs`.
    #[error("wrong $ref format: {0}")]
    MalformedReference(String),

    /// A well-formed local `$ref` naming a definition that does not exist.
    #[error("$ref {0} does not resolve to a known definition")]
    UnresolvedReference(String),

    /// A node missing an attribute its kind needs (array without items, ...).
    #[error("invalid schema at {at}: {reason}")]
    SchemaShape { at: String, reason: String },
}

impl GenerateError {
    pub(crate) fn unsupported(at: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedShape { at: at.into(), reason: reason.into() }
    }

    pub(crate) fn shape(at: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaShape { at: at.into(), reason: reason.into() }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
