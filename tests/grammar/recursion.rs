//! Self-referential and mutually recursive records.

use serde_json::json;

use pie_bnf::blocks::hash_key;
use pie_bnf::schema::{self, CompileOptions, Field, Registry, Type};
use pie_bnf::SchemaError;

use crate::common::Recognizer;

#[test]
fn test_self_typed_field_terminates() {
    let registry = Registry::new().record(
        "Author",
        [
            Field::new("name", Type::String),
            Field::new("first_author", Type::record("Author")),
        ],
    );
    let (start, grammar) = schema::compile(&registry, "Author", &CompileOptions::default()).unwrap();

    let g = Recognizer::parse(&grammar);
    assert!(g.undefined_refs().is_empty());

    let forward = format!("__bjr_{}_decl", hash_key("Author"));
    assert!(grammar.contains(&format!("<{forward}>::=<{start}>")));
}

#[test]
fn test_recursive_list_accepts_nested_payloads() {
    let registry = Registry::new().record(
        "Author",
        [
            Field::new("name", Type::String),
            Field::new("coauthors", Type::list(Type::record("Author"))),
        ],
    );
    let options = CompileOptions::default();
    let (start, grammar) = schema::compile(&registry, "Author", &options).unwrap();
    let g = Recognizer::parse(&grammar);

    let payload = json!({
        "name": "a",
        "coauthors": [
            {"name": "b", "coauthors": []},
            {"name": "c", "coauthors": [{"name": "d", "coauthors": []}]},
        ],
    });
    let decoded = schema::decode(&registry, "Author", &payload, &options).unwrap();
    assert_eq!(decoded.to_json(), payload);
    assert!(g.accepts(&start, &decoded.encode()));
    assert!(!g.accepts(&start, r#"{"name": "a", "coauthors": [{"name": "b"}]}"#));
}

#[test]
fn test_mutual_recursion() {
    let registry = Registry::new()
        .record(
            "Folder",
            [
                Field::new("name", Type::String),
                Field::new("files", Type::list(Type::record("File"))),
            ],
        )
        .record(
            "File",
            [
                Field::new("size", Type::Int),
                Field::new("parents", Type::list(Type::record("Folder"))),
            ],
        );
    let options = CompileOptions::default();
    let (start, grammar) = schema::compile(&registry, "Folder", &options).unwrap();
    let g = Recognizer::parse(&grammar);
    assert!(g.undefined_refs().is_empty());

    let payload = json!({
        "name": "root",
        "files": [{"size": 3, "parents": [{"name": "up", "files": []}]}],
    });
    let decoded = schema::decode(&registry, "Folder", &payload, &options).unwrap();
    assert!(g.accepts(&start, &decoded.encode()));
}

#[test]
fn test_cycle_is_rejected_when_recursion_is_off() {
    let registry = Registry::new().record(
        "Author",
        [Field::new("first_author", Type::record("Author"))],
    );
    let options = CompileOptions {
        allow_recursion: false,
        ..CompileOptions::default()
    };
    assert_eq!(
        schema::compile(&registry, "Author", &options).unwrap_err(),
        SchemaError::Cycle {
            path: vec!["Author".into(), "Author".into()]
        }
    );
}

#[test]
fn test_shared_non_recursive_record_is_not_a_cycle() {
    let registry = Registry::new()
        .record(
            "Pair",
            [
                Field::new("left", Type::record("Leaf")),
                Field::new("right", Type::record("Leaf")),
            ],
        )
        .record("Leaf", [Field::new("v", Type::Int)]);
    let options = CompileOptions {
        allow_recursion: false,
        ..CompileOptions::default()
    };
    let (start, grammar) = schema::compile(&registry, "Pair", &options).unwrap();
    assert!(!grammar.contains("__bjr_"));
    assert!(Recognizer::parse(&grammar).accepts(&start, r#"{"left": {"v": 1}, "right": {"v": 2}}"#));
}
