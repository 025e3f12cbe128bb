use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::{GenerateError, Result};
use crate::ir::{ArrayConstraints, Bound, NumericConstraints, StringConstraints, TypeNode};
use crate::schema::{Exclusive, Items, SchemaDocument, TypeNames};

/// Lower one schema document into the type graph.
///
/// `at` is a `#/...` location used only in error messages.
pub fn lower_to_ir(doc: &SchemaDocument, at: &str) -> Result<TypeNode> {
    // `$ref` wins over every sibling keyword
    if let Some(pointer) = &doc.ref_ {
        return Ok(TypeNode::Reference(pointer.clone()));
    }
    if let Some(values) = &doc.enum_ {
        return lower_enum(doc, values, at);
    }

    let name = match &doc.type_ {
        Some(TypeNames::One(name)) => name.as_str(),
        Some(TypeNames::Many(names)) if names.len() == 1 => names[0].as_str(),
        Some(TypeNames::Many(_)) => {
            return Err(GenerateError::unsupported(at, "multiple type is not supported"));
        }
        None if doc.properties.is_some() => "object",
        None => return Err(GenerateError::shape(at, "must define type impl")),
    };

    match name {
        "null" => Ok(TypeNode::Null),
        "boolean" => Ok(TypeNode::Boolean),
        "integer" => Ok(TypeNode::Integer(lower_numeric(doc))),
        "number" => Ok(TypeNode::Number(lower_numeric(doc))),
        "string" => lower_string(doc, at),
        "array" => lower_array(doc, at),
        "object" => lower_object(doc, at),
        other => Err(GenerateError::unsupported(at, format!("unknown type {other}"))),
    }
}

fn lower_enum(doc: &SchemaDocument, values: &[Value], at: &str) -> Result<TypeNode> {
    let declared_string = match &doc.type_ {
        None => true,
        Some(TypeNames::One(name)) => name == "string",
        Some(TypeNames::Many(names)) => names.len() == 1 && names[0] == "string",
    };
    if !declared_string {
        return Err(GenerateError::unsupported(at, "only support string enum"));
    }
    if values.is_empty() {
        return Err(GenerateError::shape(at, "enum must list at least one value"));
    }
    let literals = values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            _ => Err(GenerateError::unsupported(at, "only support string enum")),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TypeNode::Enum(literals))
}

fn lower_numeric(doc: &SchemaDocument) -> NumericConstraints {
    NumericConstraints {
        minimum: lower_bound(doc.minimum, doc.exclusive_minimum, |a, b| a > b),
        maximum: lower_bound(doc.maximum, doc.exclusive_maximum, |a, b| a < b),
        multiple_of: doc.multiple_of.map(OrderedFloat),
    }
}

/// Merge the inclusive keyword with its exclusive sibling.
///
/// `stricter(a, b)` is true when bound `a` excludes more than bound `b`. With
/// both an inclusive and a draft-6 exclusive bound present, the stricter wins
/// (ties go to the exclusive one).
fn lower_bound(
    inclusive: Option<f64>,
    exclusive: Option<Exclusive>,
    stricter: impl Fn(f64, f64) -> bool,
) -> Option<Bound> {
    let bound = |value: f64, exclusive: bool| Bound { value: OrderedFloat(value), exclusive };
    match (inclusive, exclusive) {
        (None, None) | (None, Some(Exclusive::Flag(_))) => None,
        (Some(v), None) => Some(bound(v, false)),
        (Some(v), Some(Exclusive::Flag(flag))) => Some(bound(v, flag)),
        (None, Some(Exclusive::Bound(e))) => Some(bound(e, true)),
        (Some(v), Some(Exclusive::Bound(e))) => {
            if stricter(v, e) { Some(bound(v, false)) } else { Some(bound(e, true)) }
        }
    }
}

fn lower_string(doc: &SchemaDocument, at: &str) -> Result<TypeNode> {
    if let Some(pattern) = &doc.pattern {
        // reject at generation time rather than at first use of the generated code
        regex::Regex::new(pattern)
            .map_err(|err| GenerateError::shape(at, format!("invalid pattern: {err}")))?;
    }
    Ok(TypeNode::String(StringConstraints {
        min_length: doc.min_length,
        max_length: doc.max_length,
        pattern: doc.pattern.clone(),
        format: doc.format.clone(),
    }))
}

fn lower_array(doc: &SchemaDocument, at: &str) -> Result<TypeNode> {
    let items = match &doc.items {
        None => None,
        Some(Items::Single(item)) => Some(Box::new(lower_to_ir(item, &format!("{at}/items"))?)),
        Some(Items::Tuple(_)) => {
            return Err(GenerateError::unsupported(at, "only support single type array"));
        }
    };
    Ok(TypeNode::Array {
        items,
        additional_items: doc.additional_items.is_some(),
        constraints: ArrayConstraints {
            min_items: doc.min_items,
            max_items: doc.max_items,
            unique_items: doc.unique_items,
        },
    })
}

fn lower_object(doc: &SchemaDocument, at: &str) -> Result<TypeNode> {
    let mut properties = indexmap::IndexMap::new();
    for (name, prop) in doc.properties.iter().flatten() {
        let ty = lower_to_ir(prop, &format!("{at}/properties/{name}"))?;
        properties.insert(name.clone(), ty);
    }
    Ok(TypeNode::Object { properties, required: doc.required.clone() })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_document;

    fn lower(src: &str) -> Result<TypeNode> {
        lower_to_ir(&load_document(src).unwrap(), "#")
    }

    #[test]
    fn integer_bounds_lower_inclusive_by_default() {
        let node = lower(r#"{ "type": "integer", "minimum": 0, "maximum": 10 }"#).unwrap();
        let TypeNode::Integer(c) = node else { panic!("expected integer") };
        assert_eq!(c.minimum, Some(Bound { value: OrderedFloat(0.0), exclusive: false }));
        assert_eq!(c.maximum, Some(Bound { value: OrderedFloat(10.0), exclusive: false }));
        assert!(c.multiple_of.is_none());
    }

    #[test]
    fn draft6_exclusive_bound_takes_the_stricter_side() {
        let node = lower(r#"{ "type": "number", "minimum": 1, "exclusiveMinimum": 3 }"#).unwrap();
        let TypeNode::Number(c) = node else { panic!("expected number") };
        assert_eq!(c.minimum, Some(Bound { value: OrderedFloat(3.0), exclusive: true }));

        let node = lower(r#"{ "type": "number", "maximum": 1, "exclusiveMaximum": 3 }"#).unwrap();
        let TypeNode::Number(c) = node else { panic!("expected number") };
        assert_eq!(c.maximum, Some(Bound { value: OrderedFloat(1.0), exclusive: false }));
    }

    #[test]
    fn ref_wins_over_siblings() {
        let node = lower(r##"{ "$ref": "#/definitions/a", "type": "string" }"##).unwrap();
        assert_eq!(node, TypeNode::Reference("#/definitions/a".into()));
    }

    #[test]
    fn properties_without_type_is_object() {
        let node = lower(r#"{ "properties": { "id": { "type": "integer" } }, "required": ["id"] }"#).unwrap();
        let TypeNode::Object { properties, required } = node else { panic!("expected object") };
        assert_eq!(properties.len(), 1);
        assert_eq!(required, Some(vec!["id".to_string()]));
    }

    #[test]
    fn nullable_single_element_type_list_is_accepted() {
        assert_eq!(lower(r#"{ "type": ["boolean"] }"#).unwrap(), TypeNode::Boolean);
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let cases = [
            r#"{ "type": ["string", "null"] }"#,
            r#"{ "type": "array", "items": [{ "type": "string" }] }"#,
            r#"{ "enum": ["a", 1] }"#,
            r#"{ "type": "integer", "enum": [1, 2] }"#,
            r#"{ "type": "tuple" }"#,
        ];
        for src in cases {
            assert!(
                matches!(lower(src), Err(GenerateError::UnsupportedShape { .. })),
                "{src} should be unsupported"
            );
        }
    }

    #[test]
    fn rejects_missing_attributes() {
        let cases = [r#"{}"#, r#"{ "enum": [] }"#, r#"{ "type": "string", "pattern": "(" }"#];
        for src in cases {
            assert!(
                matches!(lower(src), Err(GenerateError::SchemaShape { .. })),
                "{src} should be a shape error"
            );
        }
    }

    #[test]
    fn array_keeps_missing_items_and_additional_items_for_the_emitter() {
        let node = lower(r#"{ "type": "array", "additionalItems": false, "items": { "type": "string" } }"#).unwrap();
        assert!(matches!(node, TypeNode::Array { additional_items: true, items: Some(_), .. }));
        let node = lower(r#"{ "type": "array" }"#).unwrap();
        assert!(matches!(node, TypeNode::Array { items: None, .. }));
    }

    #[test]
    fn nested_error_location_names_the_property() {
        let err = lower(r#"{ "type": "object", "properties": { "tags": { "type": ["a", "b"] } } }"#).unwrap_err();
        assert_eq!(
            err,
            GenerateError::unsupported("#/properties/tags", "multiple type is not supported")
        );
    }
}
