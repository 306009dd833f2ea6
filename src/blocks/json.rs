//! JSON value fragments.
//!
//! Scalars are singletons per table. Containers are keyed by a hash of the
//! references they are built from, so `array(string)` requested from two call
//! sites is emitted once.
//!
//! Containers render in one canonical layout: `", "` between items and
//! `": "` after object keys, no other whitespace.

use serde_json::Value;

use super::hash_key;
use crate::bnf::{escape, except, literal, union, RuleRef, RuleSet};
use crate::error::GrammarError;

pub fn null(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bjn", |_| Ok(literal("null")))
}

/// Decimal number with optional sign, fraction and exponent.
pub fn number(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bjnu", |rules| {
        let exp_indicator = rules.define(union([literal("e"), literal("E")]))?;
        let onenine = rules.define(union((1..=9).map(literal)))?;
        let sign = rules.define(union([literal("+"), literal("-")]))?;

        let digit = rules.define(format!("{}|{onenine}", literal("0")))?;
        let digits = rules.repeat(&digit)?;
        let integer = rules.define(format!("{digit}|{onenine}{digits}"))?;
        let signed = rules.define(format!("{integer}|{sign}{integer}"))?;
        let exp = rules.define(format!(
            "{exp_indicator}{digits}|{exp_indicator}{sign}{digits}"
        ))?;
        let fraction = rules.define(format!("{}{digits}", literal(".")))?;

        Ok(union([
            signed.to_string(),
            format!("{signed}{exp}"),
            format!("{signed}{fraction}"),
            format!("{signed}{fraction}{exp}"),
        ]))
    })
}

/// Quoted JSON string, including the empty string.
pub fn string(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bjs", |rules| {
        let hex_digit =
            rules.define(union("0123456789ABCDEFabcdef".chars().map(literal)))?;
        let hex4 = rules.define(format!("{hex_digit}{hex_digit}{hex_digit}{hex_digit}"))?;

        let mut escape_letters: Vec<String> = "/bfnrt".chars().map(literal).collect();
        escape_letters.push(literal('\\'));
        escape_letters.push(literal('"'));
        escape_letters.push(format!("{}{hex4}", literal('u')));
        let escapes = rules.define(union(escape_letters))?;
        let escaped = rules.define(format!("{}{escapes}", literal('\\')))?;

        let not_allowed = rules.define(union(["\n", "\t", "\r", "\"", "\\"].map(literal)))?;
        let unescaped = rules.define(except(&not_allowed))?;
        let character = rules.define(union([&escaped, &unescaped]))?;
        let characters = rules.repeat(&character)?;

        let quote = literal('"');
        Ok(union([
            format!("{quote}{characters}{quote}"),
            literal("\"\""),
        ]))
    })
}

pub fn boolean(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bjb", |_| Ok(union([literal("true"), literal("false")])))
}

/// Homogeneous array of `inner`, possibly empty.
pub fn array(rules: &mut RuleSet<'_>, inner: &RuleRef) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bja_{}", hash_key(&inner.to_string()));
    rules.cached(&prefix, |rules| {
        let trail = rules.repeat(format!("{}{inner}", literal(", ")))?;
        let (open, close) = (literal("["), literal("]"));
        Ok(union([
            literal("[]"),
            format!("{open}{inner}{close}"),
            format!("{open}{inner}{trail}{close}"),
        ]))
    })
}

/// Fixed-length array whose positions follow `items` in order.
pub fn items(rules: &mut RuleSet<'_>, items: &[RuleRef]) -> Result<RuleRef, GrammarError> {
    let canonical: Vec<String> = items.iter().map(RuleRef::to_string).collect();
    let prefix = format!("__bji_{}", hash_key(&canonical.join("[")));
    rules.cached(&prefix, |_| {
        let mut production = literal("[");
        for (i, item) in canonical.iter().enumerate() {
            if i > 0 {
                production.push_str(&literal(", "));
            }
            production.push_str(item);
        }
        production.push_str(&literal("]"));
        Ok(production)
    })
}

/// One of a closed set of alternatives, each already rendered as production
/// text (a literal or a rule reference).
pub fn enumeration<S: AsRef<str>>(
    rules: &mut RuleSet<'_>,
    members: &[S],
) -> Result<RuleRef, GrammarError> {
    let members: Vec<&str> = members.iter().map(AsRef::as_ref).collect();
    let prefix = format!("__bje_{}", hash_key(&members.join("|")));
    rules.cached(&prefix, |_| Ok(union(&members)))
}

/// Object with exactly the given keys, in order.
pub fn object(
    rules: &mut RuleSet<'_>,
    fields: &[(String, RuleRef)],
) -> Result<RuleRef, GrammarError> {
    let canonical: Vec<String> = fields.iter().map(|(k, v)| format!("{k}{v}")).collect();
    let prefix = format!("__bjo_{}", hash_key(&canonical.join(",")));
    rules.cached(&prefix, |_| {
        let mut production = literal("{");
        for (i, (name, value)) in fields.iter().enumerate() {
            production.push_str(&object_key(name, i == 0));
            production.push_str(&value.to_string());
        }
        production.push_str(&literal("}"));
        Ok(production)
    })
}

/// `inner` wrapped in JSON string quotes, for atomics whose own grammar has
/// no quotes.
pub fn quoted(rules: &mut RuleSet<'_>, inner: &RuleRef) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bjq_{}", hash_key(&inner.to_string()));
    rules.cached(&prefix, |_| {
        let quote = literal('"');
        Ok(format!("{quote}{inner}{quote}"))
    })
}

/// Key terminal including the separator that precedes it. Always
/// single-quoted since it holds the JSON-quoted key. The key text gets the
/// usual terminal escapes, and embedded `'` is escaped too.
fn object_key(name: &str, first: bool) -> String {
    let json_key = Value::String(name.to_string()).to_string();
    let key = escape(&json_key).replace('\'', "\\'");
    if first {
        format!("'{key}: '")
    } else {
        format!("', {key}: '")
    }
}
