//! Rust-side evaluation of the constraints generated validators enforce.
//!
//! Walks a named type against a decoded JSON value in the same order as the
//! emitted code and stops at the first violation, reporting the same reason
//! strings.
//!
//! Two places are stricter or looser than generated Go, which leans on
//! `encoding/json`:
//! - a required member present as `null` fails here, while Go sees the key
//!   and decodes the zero value;
//! - an integral float such as `1.0` passes as an integer here, while Go
//!   refuses to unmarshal it into `int`.
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::emit::reasons;
use crate::error::GenerateError;
use crate::flatten::{TypeEntry, TypeTable};
use crate::ir::{ArrayConstraints, Bound, NumericConstraints, StringConstraints, TypeNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The instance violates the schema.
    #[error("{reason}{}", location(.path))]
    Violation { reason: String, path: String },
    /// The schema itself cannot be evaluated (unknown type, bad reference).
    #[error(transparent)]
    Schema(#[from] GenerateError),
}

fn location(path: &str) -> String {
    if path.is_empty() { String::new() } else { format!(" at {path}") }
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Check `value` against the type registered as `type_name`.
///
/// `type_name` is a flattened definition name (`outer/inner`) or a rendered
/// identifier (`OuterInner`).
pub fn check_instance(table: &TypeTable, type_name: &str, value: &Value) -> Result<(), CheckError> {
    let entry = lookup(table, type_name)?;
    Checker { table }.check(&entry.node, value, &mut Vec::new())
}

fn lookup<'t>(table: &'t TypeTable, type_name: &str) -> Result<&'t TypeEntry, CheckError> {
    table
        .get(type_name)
        .or_else(|| table.iter().map(|(_, entry)| entry).find(|entry| entry.ident == type_name))
        .ok_or_else(|| CheckError::Schema(GenerateError::UnresolvedReference(type_name.to_string())))
}

struct Checker<'t> {
    table: &'t TypeTable,
}

impl Checker<'_> {
    fn check(&self, node: &TypeNode, value: &Value, path: &mut Vec<Segment>) -> Result<(), CheckError> {
        match node {
            TypeNode::Null => expect(value.is_null(), "expected null", path),
            TypeNode::Boolean => expect(value.is_boolean(), "expected boolean", path),
            TypeNode::Integer(constraints) => {
                let number = value
                    .as_f64()
                    .filter(|n| n.fract() == 0.0)
                    .ok_or_else(|| violation("expected integer", path))?;
                expect(numeric_ok(number, constraints), reasons::INTEGER, path)
            }
            TypeNode::Number(constraints) => {
                let number = value.as_f64().ok_or_else(|| violation("expected number", path))?;
                expect(numeric_ok(number, constraints), reasons::NUMBER, path)
            }
            TypeNode::String(constraints) => {
                let text = value.as_str().ok_or_else(|| violation("expected string", path))?;
                self.check_string(text, constraints, path)
            }
            TypeNode::Array { items, constraints, .. } => {
                let Some(item) = items else {
                    return Err(GenerateError::shape(render(path), "array must have item type").into());
                };
                let elements = match value {
                    Value::Array(elements) => elements,
                    Value::Null => return Err(violation(reasons::ARRAY_PRESENT, path)),
                    _ => return Err(violation("expected array", path)),
                };
                expect(array_ok(elements, constraints), reasons::ARRAY, path)?;
                for (index, element) in elements.iter().enumerate() {
                    path.push(Segment::Index(index));
                    self.check(item, element, path)?;
                    path.pop();
                }
                Ok(())
            }
            TypeNode::Object { properties, required } => {
                let object = value.as_object().ok_or_else(|| violation("expected object", path))?;
                self.check_object(object, properties, required.as_deref().unwrap_or_default(), path)
            }
            TypeNode::Enum(values) => {
                let known = value.as_str().is_some_and(|s| values.iter().any(|v| v == s));
                expect(known, reasons::ENUM, path)
            }
            TypeNode::Reference(pointer) => {
                // validated against the referenced type's own root
                let entry = self.table.resolve(pointer)?;
                self.check(&entry.node, value, &mut Vec::new())
            }
        }
    }

    fn check_string(&self, text: &str, constraints: &StringConstraints, path: &[Segment]) -> Result<(), CheckError> {
        let length = text.chars().count() as u64;
        let length_ok = constraints.min_length.is_none_or(|min| length >= min)
            && constraints.max_length.is_none_or(|max| length <= max);
        expect(length_ok, reasons::STRING_LENGTH, path)?;
        if let Some(pattern) = &constraints.pattern {
            let re = regex::Regex::new(pattern)
                .map_err(|err| GenerateError::shape(render(path), format!("invalid pattern: {err}")))?;
            expect(re.is_match(text), reasons::STRING_PATTERN, path)?;
        }
        Ok(())
    }

    fn check_object(
        &self,
        object: &Map<String, Value>,
        properties: &IndexMap<String, TypeNode>,
        required: &[String],
        path: &mut Vec<Segment>,
    ) -> Result<(), CheckError> {
        let mut names = properties.keys().collect::<Vec<_>>();
        names.sort_unstable();
        let is_required = |name: &str| required.iter().any(|r| r == name);

        for name in names.iter().filter(|name| is_required(name)) {
            if !object.contains_key(name.as_str()) {
                path.push(Segment::Key(name.to_string()));
                return Err(violation(reasons::MEMBER_REQUIRED, path));
            }
        }
        for name in names {
            let member = object.get(name.as_str());
            let member = match member {
                Some(Value::Null) | None if !is_required(name) => continue,
                Some(member) => member,
                None => continue,
            };
            path.push(Segment::Key(name.clone()));
            self.check(&properties[name.as_str()], member, path)?;
            path.pop();
        }
        Ok(())
    }
}

fn numeric_ok(number: f64, constraints: &NumericConstraints) -> bool {
    let above = |bound: Bound| if bound.exclusive { number > bound.value.0 } else { number >= bound.value.0 };
    let below = |bound: Bound| if bound.exclusive { number < bound.value.0 } else { number <= bound.value.0 };
    constraints.minimum.is_none_or(above)
        && constraints.maximum.is_none_or(below)
        && constraints.multiple_of.is_none_or(|m| number % m.0 == 0.0)
}

fn array_ok(elements: &[Value], constraints: &ArrayConstraints) -> bool {
    let count = elements.len() as u64;
    let count_ok = constraints.min_items.is_none_or(|min| count >= min)
        && constraints.max_items.is_none_or(|max| count <= max);
    let unique_ok = !constraints.unique_items
        || elements.iter().enumerate().all(|(i, a)| elements[..i].iter().all(|b| a != b));
    count_ok && unique_ok
}

fn expect(ok: bool, reason: &str, path: &[Segment]) -> Result<(), CheckError> {
    if ok { Ok(()) } else { Err(violation(reason, path)) }
}

fn violation(reason: &str, path: &[Segment]) -> CheckError {
    CheckError::Violation { reason: reason.to_string(), path: render(path) }
}

fn render(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        let _ = match segment {
            Segment::Key(key) => write!(out, "[{}]", Value::from(key.as_str())),
            Segment::Index(index) => write!(out, "[{index}]"),
        };
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
