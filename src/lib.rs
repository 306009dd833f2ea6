//! Typed BNF grammars for structured generation.
//!
//! This crate turns a structural description of a record type into a
//! context-free grammar the inference engine's BNF constraint consumes, and
//! decodes already-parsed payloads back against the same description.
//!
//! The crate is built in three layers:
//!
//! 1. [`bnf`] -- the rule table, scoped rule sets and the small production
//!    algebra (literal, union, join, optional, except, repeat).
//! 2. [`blocks`] -- memoized grammar fragments: JSON primitives and
//!    containers, Markdown structure, and special atomic formats.
//! 3. [`schema`] -- type descriptors, the compiler that maps them to
//!    fragments, and the decoder that validates payloads against them.
//!
//! # Usage
//!
//! ```rust
//! use pie_bnf::schema::{self, CompileOptions, Field, Registry, Type};
//!
//! let registry = Registry::new().record(
//!     "Person",
//!     vec![
//!         Field::new("name", Type::String),
//!         Field::new("age", Type::String),
//!     ],
//! );
//!
//! let (start, grammar) = schema::compile(&registry, "Person", &CompileOptions::default())?;
//! // `grammar` holds one `<id>::=...` production per line, `start` names the entry rule.
//! ```

pub mod blocks;
pub mod bnf;
pub mod error;
pub mod schema;

pub use bnf::{Rule, RuleRef, RuleSet, RuleTable};
pub use error::{DecodeError, GrammarError, SchemaError};
