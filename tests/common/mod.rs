//! Test infrastructure for integration tests.
//!
//! Provides a small recognizer over emitted grammar text, so tests can check
//! that a payload is a valid derivation without an inference engine.


pub use recognizer::Recognizer;
