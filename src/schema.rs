//! Record schemas and the compiler that turns them into grammars.
//!
//! A [`Registry`] maps record names to ordered field lists. Each field carries
//! a [`Type`] descriptor; records refer to each other by name, which is how
//! self-referential and mutually recursive shapes are expressed.
//!
//! The same registry drives both directions:
//!
//! - [`compile`] walks a root record and emits a grammar whose language is
//!   the canonical JSON rendering of that record.
//! - [`decode`] checks an already-parsed [`serde_json::Value`] against the
//!   root record and returns a [`Decoded`] tree.
//!
//! Both directions dispatch through a [`BnfFactory`]. [`JsonFactory`] is the
//! built-in one; records may name a different factory, in which case fields of
//! that record type delegate to it.

mod compile;
mod decode;
mod file;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bnf::{RuleRef, RuleTable};
use crate::error::{DecodeError, SchemaError};

pub use compile::{BnfFactory, CompileContext, JsonFactory};
pub use decode::{DecodeContext, DecodePath, Decoded, Segment};
pub use file::SchemaFile;

/// Shape of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    /// The `...` marker. Only meaningful as a rejected tuple member.
    #[serde(rename = "...")]
    Variadic,
    /// Homogeneous list. `None` when the element type is unknown.
    List(Option<Box<Type>>),
    /// Fixed-arity list, positions typed in order.
    Tuple(Vec<Type>),
    Literal(Literal),
    /// Closed set of literals of one kind.
    Union(Vec<Type>),
    /// A named record in the registry.
    Record(String),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Some(Box::new(element)))
    }

    pub fn record(name: impl Into<String>) -> Self {
        Type::Record(name.into())
    }

    /// Union of literal values.
    pub fn one_of<I, L>(members: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Type::Union(members.into_iter().map(|m| Type::Literal(m.into())).collect())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("Int"),
            Type::Float => f.write_str("Float"),
            Type::String => f.write_str("String"),
            Type::Bool => f.write_str("Bool"),
            Type::Variadic => f.write_str("..."),
            Type::List(Some(element)) => write!(f, "List<{element}>"),
            Type::List(None) => f.write_str("List<?>"),
            Type::Tuple(items) => {
                f.write_str("Tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(">")
            }
            Type::Literal(value) => write!(f, "Literal[{value}]"),
            Type::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Type::Record(name) => f.write_str(name),
        }
    }
}

/// A literal value usable in a closed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Literal {
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Str(_) => "string",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::Str(s) => Value::String(s.clone()),
        }
    }

    /// Whether `value` is this literal, compared as JSON.
    pub fn matches(&self, value: &Value) -> bool {
        self.to_json() == *value
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

/// Grammar override for an atomic field. The field still decodes by its
/// declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `%` is a digit, everything else is literal.
    Time(String),
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Output-only: excluded from the grammar and from decoding.
    #[serde(default)]
    pub derived: bool,
    #[serde(default)]
    pub format: Option<Format>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            derived: false,
            format: None,
        }
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// A format override replaces the grammar of a JSON string, so it only
    /// applies to `String` fields.
    pub fn check_format(&self) -> Result<(), SchemaError> {
        if self.format.is_some() && self.ty != Type::String {
            return Err(SchemaError::FormatOnNonString {
                field: self.name.clone(),
                ty: self.ty.to_string(),
            });
        }
        Ok(())
    }
}

/// Built-in factories a record can name in a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactoryKind {
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDef {
    pub fields: Vec<Field>,
    #[serde(default)]
    pub factory: Option<FactoryKind>,
}

impl RecordDef {
    /// Fields that are part of the input contract, in declaration order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.derived)
    }
}

/// Named record definitions plus any custom factories attached to them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: BTreeMap<String, RecordDef>,
    factories: BTreeMap<String, Arc<dyn BnfFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record with the given fields.
    pub fn record(mut self, name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        self.insert(
            name,
            RecordDef {
                fields: fields.into_iter().collect(),
                factory: None,
            },
        );
        self
    }

    /// Attach a custom factory to an existing or future record.
    pub fn with_factory(mut self, name: impl Into<String>, factory: Arc<dyn BnfFactory>) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, def: RecordDef) {
        self.records.insert(name.into(), def);
    }

    pub fn get(&self, name: &str) -> Result<&RecordDef, SchemaError> {
        self.records
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &RecordDef)> {
        self.records.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// The factory a record delegates to, if any. Custom factories win over
    /// the built-in kind named in the record definition.
    pub fn factory(&self, name: &str) -> Option<Arc<dyn BnfFactory>> {
        if let Some(factory) = self.factories.get(name) {
            return Some(Arc::clone(factory));
        }
        match self.records.get(name)?.factory? {
            FactoryKind::Json => Some(Arc::new(JsonFactory)),
        }
    }

    fn root_factory(&self, name: &str) -> Arc<dyn BnfFactory> {
        self.factory(name).unwrap_or_else(|| Arc::new(JsonFactory))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Prefix of the root naming scope.
    pub prefix: String,
    /// Forward-declare records reached again while they are being compiled.
    /// When off, that point is a [`SchemaError::Cycle`].
    pub allow_recursion: bool,
    /// Nesting bound for both compiling and decoding.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            prefix: "__bnf".to_string(),
            allow_recursion: true,
            max_depth: 64,
        }
    }
}

/// Compile `root` into a fresh table.
///
/// Returns the start rule id and the grammar text.
pub fn compile(
    registry: &Registry,
    root: &str,
    options: &CompileOptions,
) -> Result<(String, String), SchemaError> {
    let mut table = RuleTable::new();
    let start = compile_into(&mut table, registry, root, options)?;
    Ok((start.id().to_string(), table.declare()))
}

/// Compile `root` into an existing table, sharing whatever fragments it
/// already holds.
pub fn compile_into(
    table: &mut RuleTable,
    registry: &Registry,
    root: &str,
    options: &CompileOptions,
) -> Result<RuleRef, SchemaError> {
    registry.get(root)?;
    debug!(record = root, rules = table.len(), "compiling schema");

    let factory = registry.root_factory(root);
    let mut cx = CompileContext::new(registry, options, table);
    let start = factory.compile(&mut cx, root)?;

    debug!(record = root, start = %start, rules = table.len(), "schema compiled");
    Ok(start)
}

/// Check a parsed payload against `root`.
pub fn decode(
    registry: &Registry,
    root: &str,
    value: &Value,
    options: &CompileOptions,
) -> Result<Decoded, DecodeError> {
    registry.get(root)?;
    debug!(record = root, "decoding payload");

    let factory = registry.root_factory(root);
    let mut cx = DecodeContext::new(registry, options);
    factory.decode(&mut cx, value, root)
}

/// Parse `payload` as JSON, then [`decode`] it.
pub fn deserialize(
    registry: &Registry,
    root: &str,
    payload: &str,
    options: &CompileOptions,
) -> Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_str(payload)?;
    decode(registry, root, &value, options)
}

/// Members of a literal union, all of one kind.
pub(crate) fn literal_members(members: &[Type]) -> Result<Vec<&Literal>, SchemaError> {
    if members.is_empty() {
        return Err(SchemaError::EmptyUnion);
    }

    let mut literals = Vec::with_capacity(members.len());
    for member in members {
        match member {
            Type::Literal(value) => literals.push(value),
            other => return Err(SchemaError::NonLiteralUnion(other.to_string())),
        }
    }

    let first = literals[0].kind();
    if let Some(other) = literals.iter().find(|l| l.kind() != first) {
        return Err(SchemaError::MixedLiteralUnion {
            first,
            second: other.kind(),
        });
    }
    Ok(literals)
}
