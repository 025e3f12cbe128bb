//! The capability interface a target language implements.
//!
//! The walker in `emit` is written once against [`Target`]; backends only
//! supply syntax fragments and file assembly.
use crate::config::Config;
use crate::cursor::{Cursor, RawSegment};
use crate::error::Result;
use crate::ir::TypeNode;
use crate::writer::CodeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Boolean,
    Integer,
    Number,
    String,
}

/// Runtime helper functions shipped in each backend's embedded helper text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    IntegerValidation,
    NumberValidation,
    StringValidation,
    PatternValidation,
    ArrayValidation,
    EnumValidation,
}

/// Output buffers of one generation run, handed to [`Target::assemble`].
#[derive(Debug, Clone)]
pub struct FileParts {
    /// One-time support declarations (compiled patterns).
    pub globals: CodeWriter,
    /// Per-type declarations, separated by blank lines.
    pub declarations: CodeWriter,
    /// Backend-owned validator section (the TypeScript check table).
    pub checks: CodeWriter,
    /// Every generated type identifier, sorted by definition name.
    pub exported: Vec<String>,
}

impl FileParts {
    pub fn new(tab: &'static str) -> Self {
        Self {
            globals: CodeWriter::new(tab),
            declarations: CodeWriter::new(tab),
            checks: CodeWriter::new(tab),
            exported: Vec::new(),
        }
    }
}

pub trait Target {
    fn name(&self) -> &'static str;

    fn indent_unit(&self) -> &'static str;

    /// Expression naming the decoded value inside a validator.
    fn root_expr(&self) -> &'static str {
        "main"
    }

    // — declarations —

    /// Text before the type expression of a named type (`type T `).
    fn declaration_prefix(&self, ident: &str, node: &TypeNode) -> String;
    fn declaration_suffix(&self) -> &'static str;
    fn write_null(&self, decl: &mut CodeWriter, optional: bool);
    fn write_scalar(&self, decl: &mut CodeWriter, scalar: Scalar, optional: bool);
    fn open_sequence(&self, decl: &mut CodeWriter, optional: bool);
    fn close_sequence(&self, decl: &mut CodeWriter, optional: bool);
    fn open_record(&self, decl: &mut CodeWriter, optional: bool);
    fn close_record(&self, decl: &mut CodeWriter, optional: bool);
    fn open_field(&self, decl: &mut CodeWriter, name: &str, optional: bool);
    fn close_field(&self, decl: &mut CodeWriter, name: &str, optional: bool);
    fn write_reference(&self, decl: &mut CodeWriter, ident: &str, optional: bool);

    // — paths —

    fn field_accessor(&self, name: &str) -> String;

    fn index_accessor(&self, var: &str) -> String {
        format!("[{var}]")
    }

    fn raw_segment(&self, segment: &RawSegment) -> String {
        match segment {
            RawSegment::Key(key) => quote(key),
            RawSegment::Index(var) => var.clone(),
        }
    }

    // — validation —

    fn helper_name(&self, helper: Helper) -> &'static str;
    /// Argument passing a scalar at `cursor` to a validation helper.
    fn value_argument(&self, cursor: &Cursor, scalar: Scalar, optional: bool) -> String;
    /// Predicate: the value at `expr` is present (not null/undefined).
    fn present(&self, expr: &str) -> String;
    /// Predicate: the object at `object` has member `name` in the decoded input.
    fn member_present(&self, object: &Cursor, name: &str) -> String;
    fn open_if(&self, condition: &str) -> String;
    fn open_loop(&self, expr: &str, var: &str) -> String;

    fn close_block(&self, out: &mut CodeWriter) {
        out.close("}");
    }

    /// Statement aborting validation with `reason` at `cursor`.
    fn failure(&self, reason: &str, cursor: &Cursor) -> String;
    fn pattern_declaration(&self, ident: &str, pattern: &str) -> String;
    /// Whether referenced types are validated by an explicit call at the
    /// reference site rather than by the language's own decoding.
    fn validates_references_explicitly(&self) -> bool {
        false
    }

    /// Validation of a referenced type at a reference site, if the backend
    /// validates references explicitly.
    fn reference_check(&self, validation: &mut CodeWriter, ident: &str, cursor: &Cursor);

    // — assembly —

    fn render_enum(&self, file: &mut FileParts, ident: &str, values: &[String]) -> Result<()>;
    fn render_type(&self, file: &mut FileParts, ident: &str, decl: &str, validation: Option<&str>);
    fn assemble(&self, config: &Config, file: FileParts) -> String;
}

/// Double-quoted string literal valid in both Go and TypeScript.
pub fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Raw path of `cursor`, one rendered argument per segment.
pub fn raw_arguments<T: Target + ?Sized>(target: &T, cursor: &Cursor) -> Vec<String> {
    cursor.raw().iter().map(|segment| target.raw_segment(segment)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_like_json() {
        assert_eq!(quote("a\"b"), r#""a\"b""#);
        assert_eq!(quote("x\\d+"), r#""x\\d+""#);
    }
}
