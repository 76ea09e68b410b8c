//! Shared building blocks for the cadence calendar engine.
//!
//! Holds configuration, the core error type, instant normalization, the
//! cancellation signal and the pure value types used by every other crate.

pub mod cancel;
pub mod config;
pub mod error;
pub mod time;
pub mod types;
