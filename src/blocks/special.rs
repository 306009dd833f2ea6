//! Atomic formats that have no structural type of their own.

use super::hash_key;
use crate::bnf::{literal, optional, union, RuleRef, RuleSet};
use crate::error::GrammarError;

const DIGIT: &str = "__bst_d";

/// Timestamp following `mask`: every `%` is one decimal digit, every other
/// character is matched literally. `"%%%%-%%-%%"` accepts `2024-01-31`.
///
/// An empty mask fails with [`GrammarError::EmptyProduction`].
pub fn time(rules: &mut RuleSet<'_>, mask: &str) -> Result<RuleRef, GrammarError> {
    let prefix = format!("__bst_{}", hash_key(mask));
    rules.cached(&prefix, |rules| {
        let digit = digit(rules)?.to_string();
        let segments: Vec<String> = mask
            .split('%')
            .map(|segment| {
                if segment.is_empty() {
                    String::new()
                } else {
                    literal(segment)
                }
            })
            .collect();
        Ok(segments.join(&digit))
    })
}

fn digit(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    if rules.defined(DIGIT) {
        return rules.get(DIGIT);
    }
    rules
        .with_prefix("__bst")
        .define_as("d", union((0..=9).map(literal)))
}

/// E-mail address `local@domain`.
///
/// The local part is a run of letters, digits and `!#$%&*+-/=?^_~` with
/// single interior dots. The domain is a dot-separated run of labels, each
/// alphanumeric with optional interior hyphens.
pub fn email(rules: &mut RuleSet<'_>) -> Result<RuleRef, GrammarError> {
    rules.cached("__bse", |rules| {
        let letters = rules.define(union(
            ('a'..='z').chain('A'..='Z').map(literal),
        ))?;
        let digits = rules.define(union((0..=9).map(literal)))?;
        let alphanum = rules.define(union([&letters, &digits]))?;

        let hyphen = literal("-");
        let label_rest = rules.reserve();
        let production = union([
            format!("{alphanum}{label_rest}"),
            format!("{hyphen}{label_rest}"),
            alphanum.to_string(),
        ]);
        let label_rest = rules.commit(label_rest, production)?;
        let label = rules.define(optional(&alphanum, &label_rest))?;

        let more_labels = rules.repeat(format!("{}{label}", literal(".")))?;
        let domain = rules.define(optional(&label, &more_labels))?;

        let specials = rules.define(union("!#$%&*+-/=?^_~".chars().map(literal)))?;
        let allowed = rules.define(union([&specials, &alphanum]))?;

        let dotted = format!("{}{allowed}", literal("."));
        let local_rest = rules.reserve();
        let production = union([
            format!("{allowed}{local_rest}"),
            format!("{dotted}{local_rest}"),
            allowed.to_string(),
            dotted.clone(),
        ]);
        let local_rest = rules.commit(local_rest, production)?;
        let local = rules.define(optional(&allowed, &local_rest))?;

        Ok(format!("{local}{}{domain}", literal("@")))
    })
}
