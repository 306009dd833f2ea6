use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use super::{literal_members, CompileOptions, Literal, Registry, Type};
use crate::error::{DecodeError, SchemaError};

/// One step into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Location inside a payload: `$` for the root, otherwise `a.b[2].c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecodePath(Vec<Segment>);

impl DecodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl fmt::Display for DecodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A payload that conforms to its schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    List(Vec<Decoded>),
    Tuple(Vec<Decoded>),
    Literal(Literal),
    /// Visible fields in declaration order.
    Record {
        name: String,
        fields: Vec<(String, Decoded)>,
    },
}

impl Decoded {
    /// Field of a record by name.
    pub fn field(&self, name: &str) -> Option<&Decoded> {
        match self {
            Decoded::Record { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Decoded::Int(i) => Value::from(*i),
            Decoded::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
            Decoded::String(s) => Value::String(s.clone()),
            Decoded::Bool(b) => Value::Bool(*b),
            Decoded::List(items) | Decoded::Tuple(items) => {
                Value::Array(items.iter().map(Decoded::to_json).collect())
            }
            Decoded::Literal(value) => value.to_json(),
            Decoded::Record { fields, .. } => Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Build a typed value from the decoded tree.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }

    /// Render in the canonical layout the compiled grammar derives: `", "`
    /// between items, `": "` after keys, nothing else.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            Decoded::List(items) | Decoded::Tuple(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.encode_into(out);
                }
                out.push(']');
            }
            Decoded::Record { fields, .. } => {
                out.push('{');
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&Value::String(name.clone()).to_string());
                    out.push_str(": ");
                    value.encode_into(out);
                }
                out.push('}');
            }
            scalar => out.push_str(&scalar.to_json().to_string()),
        }
    }
}

/// State of one decode: where in the payload we are and how deep.
pub struct DecodeContext<'a> {
    registry: &'a Registry,
    options: &'a CompileOptions,
    path: DecodePath,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(registry: &'a Registry, options: &'a CompileOptions) -> Self {
        Self {
            registry,
            options,
            path: DecodePath::root(),
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn options(&self) -> &'a CompileOptions {
        self.options
    }

    pub fn path(&self) -> &DecodePath {
        &self.path
    }

    /// Run `f` with `segment` appended to the current path.
    pub fn at<T>(
        &mut self,
        segment: Segment,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.path.0.push(segment);
        let result = f(self);
        self.path.0.pop();
        result
    }

    /// Run `f` one nesting level deeper.
    pub fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::DepthExceeded {
                path: self.path.clone(),
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Type mismatch at the current path.
    pub fn mismatch(&self, expected: impl fmt::Display, actual: &Value) -> DecodeError {
        DecodeError::TypeMismatch {
            path: self.path.clone(),
            expected: expected.to_string(),
            actual: actual.clone(),
        }
    }
}

pub(crate) struct JsonDecoder<'r> {
    root: &'r str,
}

impl<'r> JsonDecoder<'r> {
    pub(crate) fn new(root: &'r str) -> Self {
        Self { root }
    }

    fn handle(&self, cx: &mut DecodeContext<'_>, value: &Value, ty: &Type) -> Result<Decoded, DecodeError> {
        cx.descend(|cx| match ty {
            Type::Int => value
                .as_i64()
                .map(Decoded::Int)
                .ok_or_else(|| cx.mismatch(ty, value)),
            Type::Float => value
                .as_f64()
                .map(Decoded::Float)
                .ok_or_else(|| cx.mismatch(ty, value)),
            Type::String => value
                .as_str()
                .map(|s| Decoded::String(s.to_string()))
                .ok_or_else(|| cx.mismatch(ty, value)),
            Type::Bool => value
                .as_bool()
                .map(Decoded::Bool)
                .ok_or_else(|| cx.mismatch(ty, value)),
            Type::Variadic => Err(SchemaError::NotARecord(ty.to_string()).into()),
            Type::List(None) => Err(SchemaError::UnresolvedListElement.into()),
            Type::List(Some(element)) => {
                let items = value.as_array().ok_or_else(|| cx.mismatch(ty, value))?;
                let mut decoded = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    decoded.push(cx.at(Segment::Index(i), |cx| self.handle(cx, item, element))?);
                }
                Ok(Decoded::List(decoded))
            }
            Type::Tuple(types) => self.tuple(cx, value, ty, types),
            Type::Literal(member) => self.member(cx, value, &[member]),
            Type::Union(members) => {
                let literals = literal_members(members)?;
                self.member(cx, value, &literals)
            }
            Type::Record(name) => self.record_field(cx, value, name),
        })
    }

    fn tuple(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        ty: &Type,
        types: &[Type],
    ) -> Result<Decoded, DecodeError> {
        if types.is_empty() {
            return Err(SchemaError::EmptyTuple.into());
        }
        if types.contains(&Type::Variadic) {
            return Err(SchemaError::VariadicTuple.into());
        }

        let items = value.as_array().ok_or_else(|| cx.mismatch(ty, value))?;
        if items.len() != types.len() {
            return Err(DecodeError::Arity {
                path: cx.path().clone(),
                expected: types.len(),
                actual: value.clone(),
            });
        }

        let mut decoded = Vec::with_capacity(items.len());
        for (i, (item, item_ty)) in items.iter().zip(types).enumerate() {
            decoded.push(cx.at(Segment::Index(i), |cx| self.handle(cx, item, item_ty))?);
        }
        Ok(Decoded::Tuple(decoded))
    }

    fn member(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        literals: &[&Literal],
    ) -> Result<Decoded, DecodeError> {
        match literals.iter().find(|member| member.matches(value)) {
            Some(member) => Ok(Decoded::Literal((*member).clone())),
            None => Err(DecodeError::NotAMember {
                path: cx.path().clone(),
                actual: value.clone(),
                allowed: literals.iter().map(|member| member.to_string()).collect(),
            }),
        }
    }

    fn record_field(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        name: &str,
    ) -> Result<Decoded, DecodeError> {
        if name != self.root {
            if let Some(factory) = cx.registry().factory(name) {
                return factory.decode(cx, value, name);
            }
        }
        self.record(cx, value, name)
    }

    pub(crate) fn record(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        name: &str,
    ) -> Result<Decoded, DecodeError> {
        let def = cx.registry().get(name)?;
        let object = value.as_object().ok_or_else(|| cx.mismatch(name, value))?;

        let mut fields = Vec::new();
        for field in def.visible_fields() {
            field.check_format()?;
            let decoded = cx.at(Segment::Field(field.name.clone()), |cx| {
                let Some(raw) = object.get(&field.name) else {
                    return Err(DecodeError::MissingField {
                        path: cx.path().clone(),
                        actual: value.clone(),
                    });
                };
                self.handle(cx, raw, &field.ty)
            })?;
            fields.push((field.name.clone(), decoded));
        }

        Ok(Decoded::Record {
            name: name.to_string(),
            fields,
        })
    }
}
