//! Runtime constraint semantics, exercised through the instance checker, and
//! the ignorability rule, exercised through generated output.
use schema_codegen::{
    check_instance, flatten, generate_from_str, load_document, Backend, CheckError, Config, GenerateError, TypeTable,
};
use serde_json::{json, Value};

fn table(src: &str) -> TypeTable {
    flatten(&load_document(src).unwrap(), None).unwrap()
}

fn failure(table: &TypeTable, name: &str, value: Value) -> String {
    match check_instance(table, name, &value) {
        Err(CheckError::Violation { reason, .. }) => reason,
        other => panic!("expected a violation for {value}, got {other:?}"),
    }
}

#[test]
fn integer_range_is_inclusive_by_default() {
    let t = table(r#"{ "definitions": { "n": { "type": "integer", "minimum": 0, "exclusiveMinimum": false, "maximum": 10 } } }"#);
    assert!(check_instance(&t, "n", &json!(5)).is_ok());
    assert!(check_instance(&t, "n", &json!(10)).is_ok());
    assert_eq!(failure(&t, "n", json!(-1)), "integer check failed");
}

#[test]
fn exclusive_bounds_reject_the_boundary() {
    let t = table(r#"{ "definitions": {
        "draft4": { "type": "number", "minimum": 0, "exclusiveMinimum": true },
        "draft6": { "type": "number", "exclusiveMaximum": 1.5 }
    } }"#);
    assert_eq!(failure(&t, "draft4", json!(0)), "number check failed");
    assert!(check_instance(&t, "draft4", &json!(0.1)).is_ok());
    assert_eq!(failure(&t, "draft6", json!(1.5)), "number check failed");
    assert!(check_instance(&t, "draft6", &json!(1.4)).is_ok());
}

#[test]
fn string_length_bounds() {
    let t = table(r#"{ "definitions": { "s": { "type": "string", "minLength": 2, "maxLength": 4 } } }"#);
    assert!(check_instance(&t, "s", &json!("ab")).is_ok());
    assert_eq!(failure(&t, "s", json!("a")), "string check length failed");
    assert_eq!(failure(&t, "s", json!("abcde")), "string check length failed");
}

#[test]
fn array_presence_count_and_uniqueness() {
    let t = table(r##"{ "definitions": {
        "ids": { "type": "array", "minItems": 1, "uniqueItems": true, "items": { "type": "integer" } },
        "holder": {
            "type": "object",
            "properties": { "ids": { "type": "array", "minItems": 1, "uniqueItems": true, "items": { "type": "integer" } } }
        }
    } }"##);
    assert_eq!(failure(&t, "ids", json!([])), "array check failed");
    assert_eq!(failure(&t, "ids", json!([1, 1])), "array check failed");
    assert!(check_instance(&t, "ids", &json!([1, 2])).is_ok());
    // optional: absence passes the presence guard, an empty array still fails the count
    assert!(check_instance(&t, "holder", &json!({})).is_ok());
    assert_eq!(failure(&t, "holder", json!({ "ids": [] })), "array check failed");
}

#[test]
fn required_member_must_be_present() {
    let t = table(r#"{ "definitions": { "o": {
        "type": "object", "required": ["id"], "properties": { "id": { "type": "integer" } }
    } } }"#);
    assert_eq!(failure(&t, "o", json!({})), "member cannot be undefined");
    assert!(check_instance(&t, "o", &json!({ "id": 1 })).is_ok());
}

#[test]
fn enum_rejects_unknown_literals() {
    let t = table(r#"{ "definitions": { "color": { "enum": ["red", "green"] } } }"#);
    assert!(check_instance(&t, "color", &json!("red")).is_ok());
    assert_eq!(failure(&t, "color", json!("blue")), "wrong enum value");
}

#[test]
fn first_violation_wins_in_sorted_member_order() {
    let t = table(r#"{ "definitions": { "o": { "type": "object", "properties": {
        "b": { "type": "string", "maxLength": 1 },
        "a": { "type": "integer", "maximum": 0 }
    } } } }"#);
    let err = check_instance(&t, "o", &json!({ "a": 1, "b": "xx" })).unwrap_err();
    assert_eq!(err.to_string(), r#"integer check failed at ["a"]"#);
}

#[test]
fn validators_exist_exactly_for_constrained_types() {
    let src = r##"{ "definitions": {
        "free": { "type": "object", "properties": {
            "a": { "type": "string", "format": "uri" },
            "b": { "type": "array", "items": { "type": "number" } },
            "c": { "$ref": "#/definitions/bound" }
        } },
        "bound": { "type": "object", "properties": {
            "deep": { "type": "array", "items": { "type": "object", "properties": {
                "n": { "type": "integer", "multipleOf": 3 }
            } } }
        } },
        "unique": { "type": "array", "uniqueItems": true, "items": { "type": "string" } },
        "needs": { "type": "object", "required": ["x"], "properties": { "x": { "type": "boolean" } } }
    } }"##;
    let go = generate_from_str(src, &Config::default(), Backend::Go).unwrap();
    assert!(!go.contains("func (object *Free) UnmarshalJSON"), "{go}");
    assert!(go.contains("func (object *Bound) UnmarshalJSON"), "{go}");
    assert!(go.contains("func (object *Unique) UnmarshalJSON"), "{go}");
    assert!(go.contains("func (object *Needs) UnmarshalJSON"), "{go}");

    // TypeScript dispatches references explicitly, so `free` is checked for `c`
    let ts = generate_from_str(src, &Config::default(), Backend::TypeScript).unwrap();
    assert!(ts.contains("\"Free\": function (main: any) {\n        if (main === undefined) return;\n        $checkTable[\"Bound\"]?.(main[\"c\"]);\n    },\n"), "{ts}");
    assert!(ts.contains("\"Bound\": function"), "{ts}");
    assert!(ts.contains("\"Unique\": function"), "{ts}");
    assert!(ts.contains("\"Needs\": function"), "{ts}");
}

#[test]
fn duplicate_flattened_names_are_rejected() {
    let src = r#"{ "definitions": {
        "b": { "type": "object", "definitions": { "a": { "type": "string" } } },
        "b/a": { "type": "string" }
    } }"#;
    for backend in [Backend::Go, Backend::TypeScript] {
        assert_eq!(
            generate_from_str(src, &Config::default(), backend).unwrap_err(),
            GenerateError::DuplicateDefinition("b/a".into())
        );
    }
}

#[test]
fn generation_is_byte_stable() {
    let src = r#"{ "definitions": {
        "z": { "type": "string", "pattern": "z+" },
        "m": { "type": "object", "properties": { "q": { "type": "string", "pattern": "q" }, "p": { "type": "integer" } } },
        "a": { "enum": ["x", "y"] }
    } }"#;
    for backend in [Backend::Go, Backend::TypeScript] {
        let first = generate_from_str(src, &Config::default(), backend).unwrap();
        let second = generate_from_str(src, &Config::default(), backend).unwrap();
        assert_eq!(first, second);
    }
}
