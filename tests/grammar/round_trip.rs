//! Decoded payloads re-encode to derivations of their own grammar.

use serde::Deserialize;
use serde_json::json;

use pie_bnf::schema::{self, CompileOptions, Decoded, Field, Format, Registry, Type};

use crate::common::Recognizer;

fn person() -> Registry {
    Registry::new().record(
        "Person",
        [
            Field::new("name", Type::String),
            Field::new("age", Type::String),
        ],
    )
}

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    name: String,
    age: String,
}

#[test]
fn test_person_round_trip() {
    let registry = person();
    let options = CompileOptions::default();

    let decoded =
        schema::deserialize(&registry, "Person", r#"{"name":"Red","age":"sus"}"#, &options)
            .unwrap();
    let constructed = Decoded::Record {
        name: "Person".into(),
        fields: vec![
            ("name".into(), Decoded::String("Red".into())),
            ("age".into(), Decoded::String("sus".into())),
        ],
    };
    assert_eq!(decoded, constructed);

    let typed: Person = decoded.clone().into_typed().unwrap();
    assert_eq!(
        typed,
        Person {
            name: "Red".into(),
            age: "sus".into()
        }
    );

    let (start, grammar) = schema::compile(&registry, "Person", &options).unwrap();
    let g = Recognizer::parse(&grammar);
    assert!(g.undefined_refs().is_empty());

    let encoded = decoded.encode();
    assert_eq!(encoded, r#"{"name": "Red", "age": "sus"}"#);
    assert!(g.accepts(&start, &encoded));
}

#[test]
fn test_grammar_rejects_other_layouts_and_shapes() {
    let (start, grammar) = schema::compile(&person(), "Person", &CompileOptions::default()).unwrap();
    let g = Recognizer::parse(&grammar);

    assert!(g.accepts(&start, r#"{"name": "", "age": "x"}"#));
    assert!(!g.accepts(&start, r#"{"name":"Red","age":"sus"}"#));
    assert!(!g.accepts(&start, r#"{"age": "sus", "name": "Red"}"#));
    assert!(!g.accepts(&start, r#"{"name": "Red", "age": 42}"#));
    assert!(!g.accepts(&start, "{\"name\": \"a\nb\", \"age\": \"x\"}"));
}

fn everything() -> Registry {
    Registry::new().record(
        "Entry",
        [
            Field::new("score", Type::Float),
            Field::new("count", Type::Int),
            Field::new("ok", Type::Bool),
            Field::new("pos", Type::Tuple(vec![Type::Int, Type::Int])),
            Field::new("color", Type::one_of(["red", "blue"])),
            Field::new("level", Type::one_of([1i64, 2, 3])),
            Field::new("tags", Type::list(Type::String)),
            Field::new("when", Type::String).format(Format::Time("%%%%-%%-%%".into())),
            Field::new("mail", Type::String).format(Format::Email),
            Field::new("note", Type::String).derived(),
        ],
    )
}

#[test]
fn test_every_shape_round_trips() {
    let registry = everything();
    let options = CompileOptions::default();
    let (start, grammar) = schema::compile(&registry, "Entry", &options).unwrap();
    let g = Recognizer::parse(&grammar);
    assert!(g.undefined_refs().is_empty());

    let payload = json!({
        "score": -12.5e3,
        "count": 7,
        "ok": true,
        "pos": [1, 2],
        "color": "red",
        "level": 2,
        "tags": ["a\"b", "tab\there", "\u{e9}"],
        "when": "2024-01-31",
        "mail": "first.last@ex-ample.com",
        "note": "ignored",
    });
    let decoded = schema::decode(&registry, "Entry", &payload, &options).unwrap();
    assert_eq!(decoded.field("note"), None);

    let encoded = decoded.encode();
    assert!(g.accepts(&start, &encoded), "grammar rejected {encoded}");
}

#[test]
fn test_overridden_atomics_constrain_text() {
    let registry = Registry::new().record(
        "Contact",
        [
            Field::new("when", Type::String).format(Format::Time("%%:%%".into())),
            Field::new("mail", Type::String).format(Format::Email),
        ],
    );
    let (start, grammar) = schema::compile(&registry, "Contact", &CompileOptions::default()).unwrap();
    let g = Recognizer::parse(&grammar);

    let ok = |when: &str, mail: &str| {
        g.accepts(&start, &format!(r#"{{"when": "{when}", "mail": "{mail}"}}"#))
    };
    assert!(ok("12:30", "a@b.co"));
    assert!(ok("00:00", "x_y+z@mail.example.org"));
    assert!(!ok("1:30", "a@b.co"));
    assert!(!ok("12-30", "a@b.co"));
    assert!(!ok("12:30", "a..b@c.com"));
    assert!(!ok("12:30", ".a@c.com"));
    assert!(!ok("12:30", "a.@c.com"));
    assert!(!ok("12:30", "a@-c.com"));
    assert!(!ok("12:30", "a@c-.com"));
    assert!(!ok("12:30", "a@c."));
}

#[test]
fn test_number_grammar() {
    let registry = Registry::new().record("N", [Field::new("n", Type::Float)]);
    let (start, grammar) = schema::compile(&registry, "N", &CompileOptions::default()).unwrap();
    let g = Recognizer::parse(&grammar);
    let ok = |n: &str| g.accepts(&start, &format!(r#"{{"n": {n}}}"#));

    for good in ["0", "-0", "7", "+7", "10", "3.25", "-0.5", "1e9", "1E-9", "2.5e+10"] {
        assert!(ok(good), "rejected {good}");
    }
    for bad in ["", "01", ".5", "1.", "1e", "--1", "1.2.3"] {
        assert!(!ok(bad), "accepted {bad}");
    }
}

#[test]
fn test_keys_needing_json_escapes_round_trip() {
    let registry = Registry::new().record(
        "Odd",
        [
            Field::new("a\\b", Type::String),
            Field::new("a\"b", Type::Int),
            Field::new("a\nb", Type::Bool),
            Field::new("it's", Type::String),
        ],
    );
    let options = CompileOptions::default();
    let (start, grammar) = schema::compile(&registry, "Odd", &options).unwrap();
    let g = Recognizer::parse(&grammar);

    let payload = json!({"a\\b": "x", "a\"b": 1, "a\nb": true, "it's": "y"});
    let decoded = schema::decode(&registry, "Odd", &payload, &options).unwrap();
    let encoded = decoded.encode();
    assert_eq!(
        encoded,
        r#"{"a\\b": "x", "a\"b": 1, "a\nb": true, "it's": "y"}"#
    );
    assert!(g.accepts(&start, &encoded), "grammar rejected {encoded}");

    // A lone backslash is not the JSON encoding of `a\b`.
    assert!(!g.accepts(
        &start,
        r#"{"a\b": "x", "a\"b": 1, "a\nb": true, "it's": "y"}"#
    ));
}
