//! Decode failures carry path, expectation and the offending value.

use serde_json::json;

use pie_bnf::schema::{self, CompileOptions, Decoded, Field, Registry, Type};
use pie_bnf::{DecodeError, SchemaError};

fn options() -> CompileOptions {
    CompileOptions::default()
}

#[test]
fn test_type_mismatch_names_field() {
    let registry = Registry::new().record("Profile", [Field::new("age", Type::String)]);
    let err = schema::decode(&registry, "Profile", &json!({"age": 42}), &options()).unwrap_err();

    match &err {
        DecodeError::TypeMismatch {
            path,
            expected,
            actual,
        } => {
            assert_eq!(path.to_string(), "age");
            assert_eq!(expected, "String");
            assert_eq!(actual, &json!(42));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "age: expected String, found 42");
}

#[test]
fn test_nested_path() {
    let registry = Registry::new()
        .record("Book", [Field::new("authors", Type::list(Type::record("Author")))])
        .record("Author", [Field::new("name", Type::String)]);
    let payload = json!({"authors": [{"name": "a"}, {"name": null}]});

    let err = schema::decode(&registry, "Book", &payload, &options()).unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "authors[1].name");
    assert_eq!(err.actual(), Some(&json!(null)));
}

#[test]
fn test_missing_field_reports_enclosing_object() {
    let registry = Registry::new().record(
        "Person",
        [Field::new("name", Type::String), Field::new("age", Type::String)],
    );
    let err = schema::deserialize(&registry, "Person", r#"{"age":"sus"}"#, &options()).unwrap_err();
    assert!(matches!(err, DecodeError::MissingField { .. }));
    assert_eq!(err.path().unwrap().to_string(), "name");
    assert_eq!(err.actual(), Some(&json!({"age": "sus"})));
}

#[test]
fn test_unknown_records() {
    let registry = Registry::new().record("A", [Field::new("b", Type::record("B"))]);
    let err = schema::decode(&registry, "A", &json!({"b": {}}), &options()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Schema(SchemaError::UnknownRecord(ref name)) if name == "B"
    ));

    let err = schema::decode(&registry, "Z", &json!({}), &options()).unwrap_err();
    assert!(matches!(err, DecodeError::Schema(SchemaError::UnknownRecord(_))));
}

#[test]
fn test_extra_keys_are_ignored() {
    let registry = Registry::new().record("P", [Field::new("x", Type::Int)]);
    let decoded =
        schema::decode(&registry, "P", &json!({"x": 1, "y": "ignored"}), &options()).unwrap();
    assert_eq!(
        decoded,
        Decoded::Record {
            name: "P".into(),
            fields: vec![("x".into(), Decoded::Int(1))]
        }
    );
}
