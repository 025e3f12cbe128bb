//! The recursive type walker.
//!
//! Each node writes its declaration fragment to `decl` and its runtime checks
//! to `validation`; compiled patterns go to the run-wide global buffer. The
//! return value is the node's ignorability: `true` when nothing in the subtree
//! needs a runtime check.
mod checks;

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cursor::Cursor;
use crate::error::{GenerateError, Result};
use crate::flatten::TypeTable;
use crate::ir::{ArrayConstraints, TypeNode};
use crate::naming::render_name;
use crate::target::{Scalar, Target};
use crate::writer::CodeWriter;

pub use checks::reasons;

pub struct Emitter<'a, T: Target + ?Sized> {
    target: &'a T,
    table: &'a TypeTable,
    global: CodeWriter,
    /// Compiled-pattern counter, monotonic over the whole run.
    patterns: usize,
    /// Name of the type being emitted, for error locations.
    current: String,
    /// Identifiers of the table entries that carry a validator.
    validated: BTreeSet<String>,
}

impl<'a, T: Target + ?Sized> Emitter<'a, T> {
    pub fn new(target: &'a T, table: &'a TypeTable) -> Result<Self> {
        Ok(Self {
            target,
            table,
            global: CodeWriter::new(target.indent_unit()),
            patterns: 0,
            current: String::new(),
            validated: validated_types(table, target.validates_references_explicitly())?,
        })
    }

    /// Emit one named type starting from the root cursor.
    pub fn emit_root(
        &mut self,
        name: &str,
        node: &TypeNode,
        decl: &mut CodeWriter,
        validation: &mut CodeWriter,
    ) -> Result<bool> {
        self.current = name.to_string();
        let cursor = Cursor::root(self.target.root_expr());
        let ignorable = self.emit(&cursor, node, false, decl, validation)?;
        debug!(name, kind = node.kind(), ignorable, backend = self.target.name(), "emitted type");
        Ok(ignorable)
    }

    pub fn emit(
        &mut self,
        cursor: &Cursor,
        node: &TypeNode,
        optional: bool,
        decl: &mut CodeWriter,
        validation: &mut CodeWriter,
    ) -> Result<bool> {
        match node {
            TypeNode::Null => {
                self.target.write_null(decl, optional);
                Ok(true)
            }
            TypeNode::Boolean => {
                self.target.write_scalar(decl, Scalar::Boolean, optional);
                Ok(true)
            }
            TypeNode::Integer(constraints) | TypeNode::Number(constraints) => {
                let scalar = match node {
                    TypeNode::Integer(_) => Scalar::Integer,
                    _ => Scalar::Number,
                };
                self.target.write_scalar(decl, scalar, optional);
                if constraints.is_empty() {
                    return Ok(true);
                }
                self.check_numeric(validation, cursor, scalar, constraints, optional);
                Ok(false)
            }
            TypeNode::String(constraints) => {
                self.target.write_scalar(decl, Scalar::String, optional);
                let mut ignorable = true;
                if constraints.has_length() {
                    self.check_string_length(validation, cursor, constraints, optional);
                    ignorable = false;
                }
                if let Some(pattern) = &constraints.pattern {
                    self.check_string_pattern(validation, cursor, pattern, optional);
                    ignorable = false;
                }
                Ok(ignorable)
            }
            TypeNode::Array { items, additional_items, constraints } => {
                if *additional_items {
                    return Err(GenerateError::unsupported(
                        self.location(cursor),
                        "additional items are not supported, only single type arrays",
                    ));
                }
                let Some(item) = items else {
                    return Err(GenerateError::shape(self.location(cursor), "array must have item type"));
                };
                self.emit_array(cursor, item, constraints, optional, decl, validation)
            }
            TypeNode::Object { properties, required } => {
                self.emit_object(cursor, properties, required.as_deref(), optional, decl, validation)
            }
            TypeNode::Enum(_) => Err(GenerateError::unsupported(
                self.location(cursor),
                "inline enum is not supported, move it to a definition and $ref it",
            )),
            TypeNode::Reference(pointer) => {
                let entry = self.table.resolve(pointer)?;
                self.target.write_reference(decl, &entry.ident, optional);
                if !self.validated.contains(&entry.ident) {
                    return Ok(true);
                }
                self.target.reference_check(validation, &entry.ident, cursor);
                Ok(!self.target.validates_references_explicitly())
            }
        }
    }

    fn emit_array(
        &mut self,
        cursor: &Cursor,
        item: &TypeNode,
        constraints: &ArrayConstraints,
        optional: bool,
        decl: &mut CodeWriter,
        validation: &mut CodeWriter,
    ) -> Result<bool> {
        let tab = self.target.indent_unit();
        let element = cursor.element(self.target);

        self.target.open_sequence(decl, optional);
        let mut item_validation = CodeWriter::new(tab);
        let item_ignorable = self.emit(&element, item, false, decl, &mut item_validation)?;
        self.target.close_sequence(decl, optional);

        let expr = cursor.expr();
        let mut body = CodeWriter::new(tab);
        // uniqueness alone is enough to need the array validator
        if !constraints.is_empty() {
            self.check_array(&mut body, cursor, constraints);
        }
        if !item_validation.is_empty() {
            body.open(&self.target.open_loop(&expr, &cursor.loop_var()));
            body.embed(item_validation.as_str());
            self.target.close_block(&mut body);
        }

        if optional {
            self.guard_present(validation, &expr, &body);
        } else {
            self.fail_unless(validation, &self.target.present(&expr), reasons::ARRAY_PRESENT, cursor);
            validation.embed(body.as_str());
        }
        Ok(item_ignorable && constraints.is_empty())
    }

    fn emit_object(
        &mut self,
        cursor: &Cursor,
        properties: &IndexMap<String, TypeNode>,
        required: Option<&[String]>,
        optional: bool,
        decl: &mut CodeWriter,
        validation: &mut CodeWriter,
    ) -> Result<bool> {
        let mut names = properties.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();

        let mut fields = BTreeMap::new();
        for name in &names {
            if let Some(other) = fields.insert(render_name(name), *name) {
                return Err(GenerateError::DuplicateDefinition(format!(
                    "{}.{} (properties {other:?} and {name:?})",
                    self.location(cursor),
                    render_name(name)
                )));
            }
        }

        let mut required_names = BTreeSet::new();
        for name in required.unwrap_or_default() {
            if properties.contains_key(name) {
                required_names.insert(name.as_str());
            } else {
                warn!(
                    type_name = %self.current,
                    member = %name,
                    "required member has no property definition, ignoring"
                );
            }
        }

        let mut body = CodeWriter::new(self.target.indent_unit());
        for name in &required_names {
            let member = cursor.field(self.target, name);
            let probe = self.target.member_present(cursor, name);
            self.fail_unless(&mut body, &probe, reasons::MEMBER_REQUIRED, &member);
        }

        let mut ignorable = required_names.is_empty();
        self.target.open_record(decl, optional);
        for name in names {
            let member_optional = !required_names.contains(name);
            let member = cursor.field(self.target, name);
            self.target.open_field(decl, name, member_optional);
            ignorable &= self.emit(&member, &properties[name], member_optional, decl, &mut body)?;
            self.target.close_field(decl, name, member_optional);
        }
        self.target.close_record(decl, optional);

        if optional {
            self.guard_present(validation, &cursor.expr(), &body);
        } else {
            validation.embed(body.as_str());
        }
        Ok(ignorable)
    }

    /// Run `body` only when the value at `expr` is present.
    fn guard_present(&self, validation: &mut CodeWriter, expr: &str, body: &CodeWriter) {
        if body.is_empty() {
            return;
        }
        validation.open(&self.target.open_if(&self.target.present(expr)));
        validation.embed(body.as_str());
        self.target.close_block(validation);
    }

    fn location(&self, cursor: &Cursor) -> String {
        format!("{}{}", self.current, cursor)
    }

    /// The run-wide support declarations collected so far.
    pub fn into_globals(self) -> CodeWriter {
        self.global
    }
}

/// Identifiers of every table entry that gets a validator.
///
/// Enumerations always do. With `explicit` reference dispatch a reference to a
/// validated entry makes the referencing subtree validated too, so this runs
/// to a fixed point; recursive references without constraints stay unvalidated.
pub fn validated_types(table: &TypeTable, explicit: bool) -> Result<BTreeSet<String>> {
    let mut validated = table
        .iter()
        .filter(|(_, entry)| matches!(entry.node, TypeNode::Enum(_)))
        .map(|(_, entry)| entry.ident.clone())
        .collect::<BTreeSet<_>>();
    loop {
        let mut changed = false;
        for (_, entry) in table.iter() {
            if validated.contains(&entry.ident) {
                continue;
            }
            if constrained(&entry.node, table, &validated, explicit)? {
                validated.insert(entry.ident.clone());
                changed = true;
            }
        }
        if !changed {
            return Ok(validated);
        }
    }
}

/// Whether the walker would report `node` as not ignorable.
fn constrained(node: &TypeNode, table: &TypeTable, validated: &BTreeSet<String>, explicit: bool) -> Result<bool> {
    Ok(match node {
        TypeNode::Null | TypeNode::Boolean | TypeNode::Enum(_) => false,
        TypeNode::Integer(constraints) | TypeNode::Number(constraints) => !constraints.is_empty(),
        TypeNode::String(constraints) => constraints.has_length() || constraints.pattern.is_some(),
        TypeNode::Array { items, constraints, .. } => {
            !constraints.is_empty()
                || match items {
                    Some(item) => constrained(item, table, validated, explicit)?,
                    None => false,
                }
        }
        TypeNode::Object { properties, required } => {
            let required = required.as_deref().unwrap_or_default();
            if required.iter().any(|name| properties.contains_key(name)) {
                return Ok(true);
            }
            for property in properties.values() {
                if constrained(property, table, validated, explicit)? {
                    return Ok(true);
                }
            }
            false
        }
        TypeNode::Reference(pointer) => explicit && validated.contains(&table.resolve(pointer)?.ident),
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GoTarget, TypeScriptTarget};
    use crate::flatten::flatten;
    use crate::lower::lower_to_ir;
    use crate::schema::load_document;

    fn emit_with<T: Target>(target: &T, src: &str) -> Result<(bool, String, String)> {
        let doc = load_document(src).unwrap();
        let table = flatten(&load_document(r#"{ "definitions": { "Other": { "type": "string", "minLength": 1 } } }"#).unwrap(), None)?;
        let node = lower_to_ir(&doc, "#")?;
        let mut emitter = Emitter::new(target, &table)?;
        let mut decl = CodeWriter::new(target.indent_unit());
        let mut validation = CodeWriter::new(target.indent_unit());
        let ignorable = emitter.emit_root("T", &node, &mut decl, &mut validation)?;
        Ok((ignorable, decl.finish(), validation.finish()))
    }

    #[test]
    fn unconstrained_scalars_are_ignorable() {
        for src in [
            r#"{ "type": "boolean" }"#,
            r#"{ "type": "integer" }"#,
            r#"{ "type": "string", "format": "date-time" }"#,
            r#"{ "type": "null" }"#,
        ] {
            let (ignorable, _, validation) = emit_with(&GoTarget, src).unwrap();
            assert!(ignorable, "{src}");
            assert!(validation.is_empty(), "{src}");
        }
    }

    #[test]
    fn constrained_integer_emits_negated_check() {
        let (ignorable, decl, validation) =
            emit_with(&GoTarget, r#"{ "type": "integer", "minimum": 0, "maximum": 10 }"#).unwrap();
        assert!(!ignorable);
        assert_eq!(decl, "int");
        assert_eq!(
            validation,
            "if !IntegerValidation(0, 10, true, true, false, false, 1, false, (*int)(&main)) {\n\
             \treturn validationError(\"integer check failed\")\n\
             }\n"
        );
    }

    #[test]
    fn object_members_are_sorted_and_required_probed_first() {
        let (ignorable, decl, validation) = emit_with(
            &TypeScriptTarget,
            r#"{
                "type": "object",
                "required": ["b"],
                "properties": {
                    "b": { "type": "string" },
                    "a": { "type": "integer", "minimum": 1 }
                }
            }"#,
        )
        .unwrap();
        assert!(!ignorable);
        assert_eq!(decl, "{\n    \"a\"?: number;\n    \"b\": string;\n}");
        let probe = validation.find("member cannot be undefined").unwrap();
        let bound = validation.find("integer check failed").unwrap();
        assert!(probe < bound, "{validation}");
    }

    #[test]
    fn unique_items_alone_blocks_ignorability() {
        let (ignorable, _, validation) = emit_with(
            &GoTarget,
            r#"{ "type": "array", "uniqueItems": true, "items": { "type": "integer" } }"#,
        )
        .unwrap();
        assert!(!ignorable);
        assert!(validation.contains("ArrayValidation(0, 0, false, false, true, main)"), "{validation}");
        assert!(!validation.contains("for "), "{validation}");
    }

    #[test]
    fn nested_arrays_use_distinct_loop_variables() {
        let (_, decl, validation) = emit_with(
            &GoTarget,
            r#"{ "type": "array", "items": { "type": "array", "items": { "type": "string", "minLength": 1 } } }"#,
        )
        .unwrap();
        assert_eq!(decl, "[][]string");
        assert!(validation.contains("for i0 := range main {"), "{validation}");
        assert!(validation.contains("for i1 := range main[i0] {"), "{validation}");
        assert!(validation.contains("&main[i0][i1]"), "{validation}");
        assert!(validation.contains("validationError(\"string check length failed\", i0, i1)"), "{validation}");
    }

    #[test]
    fn optional_object_validation_is_guarded() {
        let (_, _, validation) = emit_with(
            &TypeScriptTarget,
            r#"{
                "type": "object",
                "properties": {
                    "inner": { "type": "object", "properties": { "n": { "type": "number", "multipleOf": 2 } } }
                }
            }"#,
        )
        .unwrap();
        assert!(validation.starts_with("if (isPresent(main[\"inner\"])) {\n"), "{validation}");
    }

    #[test]
    fn go_references_are_ignorable_at_the_site() {
        let (ignorable, decl, validation) = emit_with(
            &GoTarget,
            r##"{ "type": "object", "properties": { "o": { "$ref": "#/definitions/Other" } } }"##,
        )
        .unwrap();
        assert!(ignorable);
        assert!(decl.contains("O *Other"), "{decl}");
        assert!(validation.is_empty(), "{validation}");
    }

    #[test]
    fn typescript_reference_to_validated_type_is_dispatched() {
        let (ignorable, decl, validation) = emit_with(
            &TypeScriptTarget,
            r##"{ "type": "object", "properties": { "o": { "$ref": "#/definitions/Other" } } }"##,
        )
        .unwrap();
        assert!(!ignorable);
        assert!(decl.contains("\"o\"?: Other;"), "{decl}");
        assert!(validation.contains("$checkTable[\"Other\"]?.(main[\"o\"]);"), "{validation}");
    }

    #[test]
    fn validated_types_follow_references_to_a_fixed_point() {
        let table = flatten(
            &load_document(
                r##"{ "definitions": {
                    "leaf": { "type": "string", "minLength": 1 },
                    "mid": { "type": "array", "items": { "$ref": "#/definitions/leaf" } },
                    "top": { "type": "object", "properties": { "m": { "$ref": "#/definitions/mid" } } },
                    "loop": { "type": "object", "properties": { "next": { "$ref": "#/definitions/loop" } } },
                    "shade": { "enum": ["dark"] }
                } }"##,
            )
            .unwrap(),
            None,
        )
        .unwrap();
        let explicit = validated_types(&table, true).unwrap();
        assert_eq!(
            explicit.iter().map(String::as_str).collect::<Vec<_>>(),
            ["Leaf", "Mid", "Shade", "Top"]
        );
        let transitive = validated_types(&table, false).unwrap();
        assert_eq!(transitive.iter().map(String::as_str).collect::<Vec<_>>(), ["Leaf", "Shade"]);
    }

    #[test]
    fn colliding_property_fields_are_rejected() {
        let err = emit_with(
            &GoTarget,
            r#"{ "type": "object", "properties": { "a-b": { "type": "string" }, "a_b": { "type": "integer" } } }"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GenerateError::DuplicateDefinition(r#"T.A_b (properties "a-b" and "a_b")"#.into())
        );
    }

    #[test]
    fn shape_errors_abort_emission() {
        let err = emit_with(&GoTarget, r#"{ "type": "array" }"#).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaShape { .. }), "{err}");

        let err = emit_with(
            &GoTarget,
            r#"{ "type": "array", "items": { "type": "string" }, "additionalItems": { "type": "integer" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedShape { .. }), "{err}");

        let err = emit_with(
            &GoTarget,
            r#"{ "type": "object", "properties": { "c": { "enum": ["x"] } } }"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GenerateError::unsupported(
                "T[\"c\"]",
                "inline enum is not supported, move it to a definition and $ref it"
            )
        );

        let err = emit_with(&GoTarget, r##"{ "$ref": "#/definitions/Missing" }"##).unwrap_err();
        assert_eq!(err, GenerateError::UnresolvedReference("#/definitions/Missing".into()));
    }
}
