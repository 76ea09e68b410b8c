//! Recurrence rules and the occurrence generator.

mod generator;
mod rule;

pub use generator::{Generated, Generator};
pub use rule::{RecurrenceRequest, Rule};
