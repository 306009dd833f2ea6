//! Reusable grammar fragments.
//!
//! Every function here follows the same contract: check the table for the
//! fragment's `<prefix>_decl` rule first, and only build it when missing.
//! Helper rules a fragment needs live under the fragment's own prefix, so
//! unrelated fragments never collide. Parametric fragments derive their prefix
//! from a content hash of the constituent rule references; two structurally
//! identical requests therefore resolve to one rule.
//!
//! - [`json`] -- JSON values: null, number, string, boolean, arrays, tuples,
//!   enumerations and objects
//! - [`markdown`] -- lines, headings, list items, lists and paragraphs
//! - [`special`] -- masked timestamps and e-mail addresses

pub mod json;
pub mod markdown;
pub mod special;

use sha2::{Digest, Sha256};

/// Memoization key for a parametric fragment: the first 16 hex digits of the
/// SHA-256 of its canonical text.
pub fn hash_key(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(16);
    key
}
