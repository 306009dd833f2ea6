//! Markdown structure fragments.
//!
//! Everything is built from [`line`]: one or more non-newline units closed by
//! a newline. Prefixed variants (headings, list items) put a literal or rule
//! in front of a line.
//!
//! Lists come in two shapes. With `count == 0` a list is an unbounded
//! repetition of items. With a finite count it is an unrolled concatenation of
//! exactly `count` items, which is the only way to pin item `k` to the marker
//! `k. ` in a numbered list.

use super::hash_key;
use crate::bnf::{except, literal, union, RuleRef, RuleSet};
use crate::error::GrammarError;

/// Marker of an unordered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Star,
    Dash,
}

impl Bullet {
    fn marker(self) -> &'static str {
        match self {
            Bullet::Star => "* ",
            Bullet::Dash => "- ",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Bullet::Star => "star",
            Bullet::Dash => "dash",
        }
    }
}

/// Marker style of an [`itemized_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Bullet(Bullet),
    /// Items are prefixed `1. `, `2. `, ... in order.
    Numbered,
}

/// One entry of an [`itemized_list`].
///
/// `prefix` follows the list marker; `body` replaces the free-text line and is
/// followed by a newline. Both are production text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntry {
    pub prefix: Option<String>,
    pub body: Option<String>,
}

impl ListEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A non-empty line and its newline. Also matches `- `, `1. ` and so on.
pub fn line(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bml", |rules| {
        let newline = rules.define(literal('\n'))?;
        let body = rules.repeat(except(&newline))?;
        Ok(format!("{body}{}", literal('\n')))
    })
}

/// `<pre><line>`, or a plain [`line`] when `pre` is `None`.
pub fn prefixed_line(rules: &mut RuleSet<'_>, pre: Option<&str>) -> Result<RuleRef, GrammarError> {
    let Some(pre) = pre else {
        return line(rules);
    };

    let prefix = format!("__bmlp_{}", hash_key(pre));
    rules.cached(&prefix, |rules| {
        let pre = rules.define(pre)?;
        let line = line(rules)?;
        Ok(format!("{pre}{line}"))
    })
}

/// A heading line: `level + 1` hashes and a space, then `pre` if given.
pub fn heading(
    rules: &mut RuleSet<'_>,
    level: usize,
    pre: Option<&str>,
) -> Result<RuleRef, GrammarError> {
    let marks = literal(format!("{} ", "#".repeat(level + 1)));
    let pre = with_marker(rules, marks, pre)?;
    prefixed_line(rules, Some(&pre))
}

/// A bullet line: `* ` or `- `, then `pre` if given.
pub fn list_item(
    rules: &mut RuleSet<'_>,
    bullet: Bullet,
    pre: Option<&str>,
) -> Result<RuleRef, GrammarError> {
    let pre = with_marker(rules, literal(bullet.marker()), pre)?;
    prefixed_line(rules, Some(&pre))
}

/// Bullet list of `count` items, or of any number of items when `count == 0`.
pub fn unordered_list(
    rules: &mut RuleSet<'_>,
    bullet: Bullet,
    count: usize,
) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bmul_{}_{count}", bullet.tag());
    rules.cached(&prefix, |rules| {
        let item = list_item(rules, bullet, None)?;
        if count == 0 {
            Ok(rules.repeat(&item)?.to_string())
        } else {
            Ok(item.to_string().repeat(count))
        }
    })
}

/// Numbered list. A finite count pins item `k` to the marker `k. `; with
/// `count == 0` any decimal marker is accepted on every item.
pub fn numbered_list(rules: &mut RuleSet<'_>, count: usize) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bmnl_{count}");
    rules.cached(&prefix, |rules| {
        if count == 0 {
            let digit = rules.define(union((0..=9).map(literal)))?;
            let number = rules.repeat(&digit)?;
            let marker = format!("{number}{}", literal(". "));
            let item = prefixed_line(rules, Some(&marker))?;
            return Ok(rules.repeat(&item)?.to_string());
        }

        let mut production = String::new();
        for k in 1..=count {
            let item = prefixed_line(rules, Some(&literal(format!("{k}. "))))?;
            production.push_str(&item.to_string());
        }
        Ok(production)
    })
}

/// Finite list whose entries each carry their own prefix or body.
///
/// At least one entry is required; an empty list fails with
/// [`GrammarError::EmptyProduction`].
pub fn itemized_list(
    rules: &mut RuleSet<'_>,
    entries: &[ListEntry],
    style: ListStyle,
) -> Result<RuleRef, GrammarError> {
    let markers: Vec<String> = (1..=entries.len())
        .map(|k| match style {
            ListStyle::Bullet(bullet) => literal(bullet.marker()),
            ListStyle::Numbered => literal(format!("{k}. ")),
        })
        .collect();

    let canonical: Vec<String> = entries
        .iter()
        .zip(&markers)
        .map(|(entry, marker)| {
            format!(
                "{marker}{}\u{1f}{}",
                entry.prefix.as_deref().unwrap_or(""),
                entry.body.as_deref().unwrap_or("")
            )
        })
        .collect();
    let prefix = format!("__bmil_{}", hash_key(&canonical.join("\u{1e}")));

    rules.cached(&prefix, |rules| {
        let mut production = String::new();
        for (entry, marker) in entries.iter().zip(markers) {
            let pre = with_marker(rules, marker, entry.prefix.as_deref())?;
            let item = match &entry.body {
                Some(body) => {
                    let body = group(rules, body)?;
                    rules.define(format!("{pre}{body}{}", literal('\n')))?
                }
                None => prefixed_line(rules, Some(&pre))?,
            };
            production.push_str(&item.to_string());
        }
        Ok(production)
    })
}

/// One or more lines closed by an empty line.
pub fn paragraph(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bmp", |rules| {
        let line = line(rules)?;
        let lines = rules.repeat(&line)?;
        Ok(format!("{lines}{}", literal('\n')))
    })
}

fn with_marker(
    rules: &mut RuleSet<'_>,
    marker: String,
    pre: Option<&str>,
) -> Result<String, GrammarError> {
    let Some(pre) = pre else {
        return Ok(marker);
    };
    let pre = group(rules, pre)?;
    Ok(format!("{marker}{pre}"))
}

/// `production` as a rule of its own, so alternations inside it stay
/// grouped when it is concatenated.
fn group(rules: &mut RuleSet<'_>, production: &str) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bmg_{}", hash_key(production));
    rules.cached(&prefix, |_| Ok(production.to_string()))
}
