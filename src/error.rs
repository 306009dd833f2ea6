//! Error taxonomy for grammar construction, schema compilation and decoding.
//!
//! Compilation and decoding are all-or-nothing: the first error aborts the
//! call and nothing partial is returned.

use serde_json::Value;
use thiserror::Error;

use crate::schema::DecodePath;

/// Errors raised by the rule table.
///
/// None of these are user-triggerable through the schema compiler; seeing one
/// means a block or the compiler broke the check-then-define contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule <{0}> is not defined")]
    NotFound(String),
    #[error("rule <{0}> is already defined")]
    Redefined(String),
    #[error("rule <{0}> was never reserved")]
    NotReserved(String),
    #[error("rule <{0}> has an empty production")]
    EmptyProduction(String),
}

/// The type descriptor itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unable to determine list element type")]
    UnresolvedListElement,
    #[error("`...` is not allowed in a tuple type, use a list instead")]
    VariadicTuple,
    #[error("unable to determine tuple item types")]
    EmptyTuple,
    #[error("unable to determine literal set: union has no members")]
    EmptyUnion,
    #[error("all union members must be literals, found {0}")]
    NonLiteralUnion(String),
    #[error("literal union mixes {first} and {second} values")]
    MixedLiteralUnion {
        first: &'static str,
        second: &'static str,
    },
    #[error("unknown record type `{0}`")]
    UnknownRecord(String),
    #[error("`{0}` is not a record type")]
    NotARecord(String),
    #[error("recursive record type: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
    #[error("field `{field}` is declared {ty}; only String fields take a format override")]
    FormatOnNonString { field: String, ty: String },
    #[error("type nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// A payload does not conform to an otherwise valid descriptor.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: DecodePath,
        expected: String,
        actual: Value,
    },
    #[error("{path}: {actual} is not one of [{}]", .allowed.join(", "))]
    NotAMember {
        path: DecodePath,
        actual: Value,
        allowed: Vec<String>,
    },
    #[error("{path}: missing required field")]
    MissingField { path: DecodePath, actual: Value },
    #[error("{path}: expected {expected} items, found {}", .actual.as_array().map_or(0, Vec::len))]
    Arity {
        path: DecodePath,
        expected: usize,
        actual: Value,
    },
    #[error("{path}: payload nesting exceeds the depth limit of {limit}")]
    DepthExceeded { path: DecodePath, limit: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// Location of the offending value inside the payload, if the error has one.
    pub fn path(&self) -> Option<&DecodePath> {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::NotAMember { path, .. }
            | Self::MissingField { path, .. }
            | Self::Arity { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::Schema(_) | Self::Json(_) => None,
        }
    }

    /// The value that failed to decode. For a missing field this is the
    /// enclosing object.
    pub fn actual(&self) -> Option<&Value> {
        match self {
            Self::TypeMismatch { actual, .. }
            | Self::NotAMember { actual, .. }
            | Self::MissingField { actual, .. }
            | Self::Arity { actual, .. } => Some(actual),
            Self::DepthExceeded { .. } | Self::Schema(_) | Self::Json(_) => None,
        }
    }
}
