use std::fmt;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::{literal_members, CompileOptions, Decoded, DecodeContext, Field, Format, Literal, RecordDef, Registry, Type};
use crate::blocks::{hash_key, json, special};
use crate::bnf::{literal, Reservation, RuleRef, RuleSet, RuleTable};
use crate::error::{DecodeError, SchemaError};

/// A grammar and decoder for one or more record types.
///
/// A registry can attach a factory to a record name; fields of that record
/// type are then compiled and decoded by the factory instead of being inlined
/// by the enclosing one. Factories receive the shared context, so the rule
/// table, recursion guard and depth bound carry across the hand-off.
pub trait BnfFactory: fmt::Debug + Send + Sync {
    fn compile(&self, cx: &mut CompileContext<'_>, record: &str) -> Result<RuleRef, SchemaError>;

    fn decode(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        record: &str,
    ) -> Result<Decoded, DecodeError>;
}

/// State of one compilation: the target table plus the records currently
/// being built.
pub struct CompileContext<'a> {
    registry: &'a Registry,
    options: &'a CompileOptions,
    table: &'a mut RuleTable,
    /// Records under construction, outermost first.
    stack: Vec<String>,
    /// Forward declarations waiting for their record to finish.
    pending: FxHashMap<String, Reservation>,
    depth: usize,
}

impl<'a> CompileContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        options: &'a CompileOptions,
        table: &'a mut RuleTable,
    ) -> Self {
        Self {
            registry,
            options,
            table,
            stack: Vec::new(),
            pending: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn options(&self) -> &'a CompileOptions {
        self.options
    }

    /// Root scope over the shared table.
    pub fn rules(&mut self) -> RuleSet<'_> {
        self.table.scope(self.options.prefix.clone())
    }

    /// Run `f` one nesting level deeper.
    pub fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SchemaError>,
    ) -> Result<T, SchemaError> {
        if self.depth >= self.options.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Build the rule for record `name` with `build`, guarding against
    /// recursion.
    ///
    /// If `name` is already under construction further up, `build` is not
    /// called. Instead a forward-declared rule is returned and committed once
    /// the outer construction finishes, or [`SchemaError::Cycle`] is raised
    /// when recursion is disabled.
    pub fn record<F>(&mut self, name: &str, build: F) -> Result<RuleRef, SchemaError>
    where
        F: FnOnce(&mut Self, &'a RecordDef) -> Result<RuleRef, SchemaError>,
    {
        if let Some(pos) = self.stack.iter().position(|open| open == name) {
            return self.forward(name, pos);
        }

        let def = self.registry.get(name)?;
        self.stack.push(name.to_string());
        let built = build(self, def);
        self.stack.pop();
        let rule = built?;

        if let Some(slot) = self.pending.remove(name) {
            debug!(record = name, rule = %slot, "closing forward declaration");
            self.rules().commit(slot, &rule)?;
        }
        Ok(rule)
    }

    fn forward(&mut self, name: &str, pos: usize) -> Result<RuleRef, SchemaError> {
        if !self.options.allow_recursion {
            let mut path = self.stack[pos..].to_vec();
            path.push(name.to_string());
            return Err(SchemaError::Cycle { path });
        }
        if let Some(slot) = self.pending.get(name) {
            return Ok(slot.to_ref());
        }

        let prefix = format!("__bjr_{}", hash_key(name));
        let mut rules = self.rules();
        let id = format!("{prefix}_decl");
        if rules.defined(&id) {
            return Ok(rules.get(&id)?);
        }
        let slot = rules.with_prefix(prefix).reserve_as("decl")?;

        warn!(record = name, rule = %slot, "recursive record, forward-declaring");
        let rule = slot.to_ref();
        self.pending.insert(name.to_string(), slot);
        Ok(rule)
    }
}

/// Renders records as JSON objects.
///
/// Objects use the canonical layout of [`crate::blocks::json`]. Overridden
/// atomics are wrapped in JSON string quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFactory;

impl BnfFactory for JsonFactory {
    fn compile(&self, cx: &mut CompileContext<'_>, record: &str) -> Result<RuleRef, SchemaError> {
        JsonCompiler { root: record }.record(cx, record)
    }

    fn decode(
        &self,
        cx: &mut DecodeContext<'_>,
        value: &Value,
        record: &str,
    ) -> Result<Decoded, DecodeError> {
        super::decode::JsonDecoder::new(record).record(cx, value, record)
    }
}

struct JsonCompiler<'r> {
    /// The record this factory invocation was asked for. Fields of this type
    /// are inlined even when the record has a factory of its own.
    root: &'r str,
}

impl JsonCompiler<'_> {
    fn handle(&self, cx: &mut CompileContext<'_>, ty: &Type) -> Result<RuleRef, SchemaError> {
        cx.descend(|cx| match ty {
            Type::Int | Type::Float => Ok(json::number(&mut cx.rules())?),
            Type::String => Ok(json::string(&mut cx.rules())?),
            Type::Bool => Ok(json::boolean(&mut cx.rules())?),
            Type::Variadic => Err(SchemaError::NotARecord(ty.to_string())),
            Type::List(None) => Err(SchemaError::UnresolvedListElement),
            Type::List(Some(element)) => {
                let inner = self.handle(cx, element)?;
                Ok(json::array(&mut cx.rules(), &inner)?)
            }
            Type::Tuple(items) => self.tuple(cx, items),
            Type::Literal(value) => self.enumeration(cx, &[value]),
            Type::Union(members) => {
                let literals = literal_members(members)?;
                self.enumeration(cx, &literals)
            }
            Type::Record(name) => self.record_field(cx, name),
        })
    }

    fn tuple(&self, cx: &mut CompileContext<'_>, items: &[Type]) -> Result<RuleRef, SchemaError> {
        if items.is_empty() {
            return Err(SchemaError::EmptyTuple);
        }
        if items.contains(&Type::Variadic) {
            return Err(SchemaError::VariadicTuple);
        }

        let mut rules = Vec::with_capacity(items.len());
        for item in items {
            rules.push(self.handle(cx, item)?);
        }
        Ok(json::items(&mut cx.rules(), &rules)?)
    }

    fn enumeration(
        &self,
        cx: &mut CompileContext<'_>,
        literals: &[&Literal],
    ) -> Result<RuleRef, SchemaError> {
        let members: Vec<String> = literals.iter().map(|l| literal(l.to_json())).collect();
        Ok(json::enumeration(&mut cx.rules(), &members)?)
    }

    fn record_field(&self, cx: &mut CompileContext<'_>, name: &str) -> Result<RuleRef, SchemaError> {
        if name != self.root {
            if let Some(factory) = cx.registry().factory(name) {
                debug!(record = name, "delegating to record factory");
                return factory.compile(cx, name);
            }
        }
        self.record(cx, name)
    }

    fn record(&self, cx: &mut CompileContext<'_>, name: &str) -> Result<RuleRef, SchemaError> {
        cx.record(name, |cx, def| {
            let mut fields = Vec::new();
            for field in def.visible_fields() {
                let rule = self.field(cx, field)?;
                fields.push((field.name.clone(), rule));
            }
            Ok(json::object(&mut cx.rules(), &fields)?)
        })
    }

    fn field(&self, cx: &mut CompileContext<'_>, field: &Field) -> Result<RuleRef, SchemaError> {
        field.check_format()?;
        let inner = match &field.format {
            Some(Format::Time(mask)) => special::time(&mut cx.rules(), mask)?,
            Some(Format::Email) => special::email(&mut cx.rules())?,
            None => return self.handle(cx, &field.ty),
        };
        Ok(json::quoted(&mut cx.rules(), &inner)?)
    }
}
