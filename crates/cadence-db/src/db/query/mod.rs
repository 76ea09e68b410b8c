//! Per-table query composition and execution.
//!
//! Each module exposes boxed query builders (`by_*`) that can be composed and
//! inspected with `diesel::debug_query`, plus async functions that run them on
//! a pooled connection.

pub mod event;
pub mod exception;
pub mod occurrence;
pub mod reminder;
pub mod rule;
