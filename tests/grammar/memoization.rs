//! Repeated and shared shapes collapse to one rule.

use pie_bnf::schema::{compile, compile_into, CompileOptions, Field, Registry, Type};
use pie_bnf::RuleTable;

fn profile() -> Registry {
    Registry::new()
        .record(
            "Profile",
            [
                Field::new("name", Type::String),
                Field::new("tags", Type::list(Type::String)),
                Field::new("aliases", Type::list(Type::String)),
                Field::new("home", Type::record("Place")),
            ],
        )
        .record(
            "Place",
            [
                Field::new("city", Type::String),
                Field::new("coords", Type::Tuple(vec![Type::Float, Type::Float])),
            ],
        )
}

#[test]
fn test_compile_twice_is_idempotent() {
    let registry = profile();
    let options = CompileOptions::default();
    let mut table = RuleTable::new();

    let first = compile_into(&mut table, &registry, "Profile", &options).unwrap();
    let text = table.declare();
    let count = table.len();

    let second = compile_into(&mut table, &registry, "Profile", &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(table.len(), count);
    assert_eq!(table.declare(), text);
}

#[test]
fn test_fresh_compilations_are_byte_identical() {
    let registry = profile();
    let options = CompileOptions::default();
    assert_eq!(
        compile(&registry, "Profile", &options).unwrap(),
        compile(&registry, "Profile", &options).unwrap()
    );
}

#[test]
fn test_recursive_compile_is_idempotent() {
    let registry = Registry::new().record(
        "Author",
        [
            Field::new("name", Type::String),
            Field::new("coauthors", Type::list(Type::record("Author"))),
        ],
    );
    let options = CompileOptions::default();
    let mut table = RuleTable::new();

    compile_into(&mut table, &registry, "Author", &options).unwrap();
    let text = table.declare();
    compile_into(&mut table, &registry, "Author", &options).unwrap();
    assert_eq!(table.declare(), text);
}

#[test]
fn test_identical_lists_share_one_array_rule() {
    let registry = profile();
    let mut table = RuleTable::new();
    let start = compile_into(&mut table, &registry, "Profile", &CompileOptions::default()).unwrap();

    let arrays: Vec<&str> = table
        .rules()
        .iter()
        .map(|rule| rule.id())
        .filter(|id| id.starts_with("__bja_") && id.ends_with("_decl"))
        .collect();
    assert_eq!(arrays.len(), 1);

    let object = table.get(start.id()).unwrap().production();
    let reference = format!("<{}>", arrays[0]);
    assert_eq!(object.matches(&reference).count(), 2);
}

#[test]
fn test_shared_scalars_across_records() {
    let registry = profile();
    let mut table = RuleTable::new();
    compile_into(&mut table, &registry, "Profile", &CompileOptions::default()).unwrap();

    let strings = table
        .rules()
        .iter()
        .filter(|rule| rule.id() == "__bjs_decl")
        .count();
    assert_eq!(strings, 1);

    // Both tuple positions are Float, so one number fragment serves both.
    let place = table
        .rules()
        .iter()
        .find(|rule| rule.id().starts_with("__bji_"))
        .unwrap();
    assert_eq!(
        place.production(),
        "\"[\"<__bjnu_decl>\", \"<__bjnu_decl>\"]\""
    );
}
