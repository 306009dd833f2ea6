use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use super::{Rule, RuleRef, RuleSet};
use crate::error::GrammarError;

/// The shared production table of one compilation.
///
/// Rules are kept in commit order so that [`RuleTable::declare`] output is
/// reproducible. Once committed a rule is never replaced.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: FxHashMap<String, usize>,
    reserved: FxHashSet<String>,
    counters: FxHashMap<String, usize>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a naming scope over this table.
    pub fn scope(&mut self, prefix: impl Into<String>) -> RuleSet<'_> {
        RuleSet::new(self, prefix.into())
    }

    /// Whether a rule is committed under `id`.
    pub fn defined(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a committed rule.
    pub fn get(&self, id: &str) -> Result<&Rule, GrammarError> {
        self.index
            .get(id)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| GrammarError::NotFound(id.to_string()))
    }

    /// Number of committed rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over committed rules in commit order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Render the table as grammar text, one production per line.
    pub fn declare(&self) -> String {
        let lines: Vec<String> = self.rules.iter().map(|rule| rule.to_string()).collect();
        lines.join("\n")
    }

    pub(crate) fn is_taken(&self, id: &str) -> bool {
        self.index.contains_key(id) || self.reserved.contains(id)
    }

    /// Next free auto-generated id for `prefix`.
    ///
    /// Counters live in the table rather than the scope handle, so two handles
    /// opened with the same prefix never hand out the same id.
    pub(crate) fn next_id(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        loop {
            let id = format!("{prefix}_{counter}");
            *counter += 1;
            if !(self.index.contains_key(&id) || self.reserved.contains(&id)) {
                return id;
            }
        }
    }

    pub(crate) fn reserve_next(&mut self, prefix: &str) -> String {
        let id = self.next_id(prefix);
        self.reserved.insert(id.clone());
        id
    }

    pub(crate) fn reserve(&mut self, id: String) -> Result<(), GrammarError> {
        if self.is_taken(&id) {
            return Err(GrammarError::Redefined(id));
        }
        self.reserved.insert(id);
        Ok(())
    }

    pub(crate) fn insert(&mut self, id: String, production: String) -> Result<RuleRef, GrammarError> {
        if self.is_taken(&id) {
            return Err(GrammarError::Redefined(id));
        }
        if production.is_empty() {
            return Err(GrammarError::EmptyProduction(id));
        }
        Ok(self.push(id, production))
    }

    /// An empty production leaves the id reserved; the compilation is
    /// abandoned anyway.
    pub(crate) fn commit(&mut self, id: String, production: String) -> Result<RuleRef, GrammarError> {
        if !self.reserved.contains(&id) {
            return Err(GrammarError::NotReserved(id));
        }
        if production.is_empty() {
            return Err(GrammarError::EmptyProduction(id));
        }
        self.reserved.remove(&id);
        Ok(self.push(id, production))
    }

    fn push(&mut self, id: String, production: String) -> RuleRef {
        trace!(rule = %id, %production, "commit rule");
        self.index.insert(id.clone(), self.rules.len());
        self.rules.push(Rule {
            id: id.clone(),
            production,
        });
        RuleRef(id)
    }
}
