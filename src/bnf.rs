//! Grammar algebra.
//!
//! A [`RuleTable`] owns every production of one compilation. [`RuleSet`]s are
//! lightweight scope handles over that table: a prefix plus a mutable borrow.
//! Deriving a sub-scope with [`RuleSet::with_prefix`] never copies the table,
//! which is what lets block functions memoize across calls -- the table is the
//! memo, keyed by prefixed rule id.
//!
//! Productions are plain text in the engine's BNF dialect:
//!
//! ```text
//! <rule_id>::=<alt_1>|<alt_2>|...
//! ```
//!
//! where an alternative concatenates quoted literals and `<rule_id>`
//! references, plus the two pseudo-rules `<any!>` and `<except!(...)>`.
//!
//! The free functions here ([`literal`], [`union`], [`join`], [`optional`],
//! [`except`], ...) only build production text. Only a [`RuleSet`] mutates the
//! table.

mod scope;
mod table;

use std::fmt;

use tracing::warn;

pub use scope::{Reservation, RuleSet};
pub use table::RuleTable;

/// A named production, owned by the [`RuleTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) id: String,
    pub(crate) production: String,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn production(&self) -> &str {
        &self.production
    }

    /// Handle to this rule, usable inside other productions.
    pub fn to_ref(&self) -> RuleRef {
        RuleRef(self.id.clone())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>::={}", self.id, self.production)
    }
}

/// Opaque handle to a rule in the table.
///
/// Displays as the nonterminal `<rule_id>`, so it can be spliced straight
/// into production text with `format!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleRef(pub(crate) String);

impl RuleRef {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Either a rule handle or raw production text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Part {
    Rule(RuleRef),
    Text(String),
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Rule(rule) => rule.fmt(f),
            Part::Text(text) => f.write_str(text),
        }
    }
}

impl From<RuleRef> for Part {
    fn from(rule: RuleRef) -> Self {
        Part::Rule(rule)
    }
}

impl From<&RuleRef> for Part {
    fn from(rule: &RuleRef) -> Self {
        Part::Rule(rule.clone())
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::Text(text)
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::Text(text.to_string())
    }
}

/// Render a value as a quoted terminal.
///
/// Newline, tab, backslash and carriage return are escaped. The result is
/// double-quoted unless the escaped text contains a `"`, in which case it is
/// single-quoted with the `"` left as is.
///
/// Embedded `'` is never escaped. A literal carrying both quote characters
/// therefore renders to text the engine will misread; it is logged rather
/// than rewritten.
pub fn literal(value: impl fmt::Display) -> String {
    let raw = value.to_string();
    let text = escape(&raw);

    if text.contains('"') {
        if text.contains('\'') {
            warn!(literal = %raw, "literal contains both quote characters; rendered unescaped");
        }
        format!("'{text}'")
    } else {
        format!("\"{text}\"")
    }
}

/// Terminal escapes: newline, tab, backslash and carriage return. Quotes are
/// left to the caller.
pub(crate) fn escape(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\n' => text.push_str("\\n"),
            '\t' => text.push_str("\\t"),
            '\\' => text.push_str("\\\\"),
            '\r' => text.push_str("\\r"),
            _ => text.push(ch),
        }
    }
    text
}

/// Alternation: `a|b|c`.
pub fn union<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut out = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        out.push_str(&part.to_string());
    }
    out
}

/// Concatenation with no separator.
pub fn join<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    parts.into_iter().map(|part| part.to_string()).collect()
}

/// `base|base tail`: the tail may or may not follow the base.
pub fn optional(base: impl fmt::Display, tail: impl fmt::Display) -> String {
    format!("{base}|{base}{tail}")
}

/// `head base|base`: the head may or may not precede the base.
pub fn optional_rev(head: impl fmt::Display, base: impl fmt::Display) -> String {
    format!("{head}{base}|{base}")
}

/// Matches one unit not matched by the argument.
///
/// A rule renders as `<except!([rule_id])>`, raw text as `<except!(text)>`.
pub fn except(part: impl Into<Part>) -> String {
    match part.into() {
        Part::Rule(rule) => format!("<except!([{}])>", rule.id()),
        Part::Text(text) => format!("<except!({text})>"),
    }
}

/// Matches one arbitrary unit.
pub fn any() -> &'static str {
    "<any!>"
}
