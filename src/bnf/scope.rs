use std::fmt;

use tracing::debug;

use super::{optional, RuleRef, RuleTable};
use crate::error::GrammarError;

/// A naming scope over a shared [`RuleTable`].
///
/// Every id a scope creates is `prefix + "_" + id`. Sub-scopes borrow the
/// same table, so a rule defined through any scope is visible to all of them.
pub struct RuleSet<'t> {
    table: &'t mut RuleTable,
    prefix: String,
}

/// A rule id claimed ahead of its production.
///
/// Displays as the nonterminal it will become, so the production can refer to
/// itself before [`RuleSet::commit`] makes it visible.
#[must_use = "a reservation must be committed"]
#[derive(Debug)]
pub struct Reservation {
    id: String,
}

impl Reservation {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn to_ref(&self) -> RuleRef {
        RuleRef(self.id.clone())
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.id)
    }
}

impl<'t> RuleSet<'t> {
    pub(crate) fn new(table: &'t mut RuleTable, prefix: String) -> Self {
        Self { table, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn table(&self) -> &RuleTable {
        self.table
    }

    /// Derive a scope with a different prefix over the same table.
    pub fn with_prefix(&mut self, prefix: impl Into<String>) -> RuleSet<'_> {
        RuleSet {
            table: &mut *self.table,
            prefix: prefix.into(),
        }
    }

    /// Whether a rule with the absolute id exists.
    pub fn defined(&self, id: &str) -> bool {
        self.table.defined(id)
    }

    /// Handle to an existing rule by absolute id.
    pub fn get(&self, id: &str) -> Result<RuleRef, GrammarError> {
        self.table.get(id).map(|rule| rule.to_ref())
    }

    /// Define a rule under the next auto-generated id of this scope.
    pub fn define(&mut self, production: impl fmt::Display) -> Result<RuleRef, GrammarError> {
        let id = self.table.next_id(&self.prefix);
        self.table.insert(id, production.to_string())
    }

    /// Define a rule under `prefix + "_" + id`.
    ///
    /// Fails if that key already exists; callers memoize by checking
    /// [`RuleSet::defined`] first.
    pub fn define_as(
        &mut self,
        id: &str,
        production: impl fmt::Display,
    ) -> Result<RuleRef, GrammarError> {
        let key = self.key(id);
        self.table.insert(key, production.to_string())
    }

    /// Claim the next auto-generated id without defining it.
    pub fn reserve(&mut self) -> Reservation {
        let id = self.table.reserve_next(&self.prefix);
        Reservation { id }
    }

    /// Claim `prefix + "_" + id` without defining it.
    pub fn reserve_as(&mut self, id: &str) -> Result<Reservation, GrammarError> {
        let key = self.key(id);
        self.table.reserve(key.clone())?;
        Ok(Reservation { id: key })
    }

    /// Give a reserved id its production and make it visible.
    pub fn commit(
        &mut self,
        reservation: Reservation,
        production: impl fmt::Display,
    ) -> Result<RuleRef, GrammarError> {
        self.table.commit(reservation.id, production.to_string())
    }

    /// One or more `element`s: `<this>::=element|element<this>`.
    ///
    /// The rule is right-recursive, so a consuming matcher keeps taking the
    /// longer alternative while it can.
    pub fn repeat(&mut self, element: impl fmt::Display) -> Result<RuleRef, GrammarError> {
        let this = self.reserve();
        let production = optional(&element, &this);
        self.commit(this, production)
    }

    /// Memoized fragment definition.
    ///
    /// Returns the rule `prefix + "_decl"` if it exists. Otherwise runs
    /// `build` in a scope named `prefix` and defines its result as that rule.
    pub fn cached<F>(&mut self, prefix: &str, build: F) -> Result<RuleRef, GrammarError>
    where
        F: FnOnce(&mut RuleSet<'_>) -> Result<String, GrammarError>,
    {
        let key = format!("{prefix}_decl");
        if self.table.defined(&key) {
            debug!(rule = %key, "fragment cache hit");
            return Ok(RuleRef(key));
        }

        debug!(rule = %key, "building fragment");
        let mut scope = self.with_prefix(prefix);
        let production = build(&mut scope)?;
        scope.define_as("decl", production)
    }

    fn key(&self, id: &str) -> String {
        format!("{}_{}", self.prefix, id)
    }
}
