//! Occurrence materialization and override resolution for a query window.

mod materializer;
mod resolver;

pub use materializer::{MaterializedOccurrence, materialize};
pub use resolver::{OccurrenceView, effective_times, resolve, single_view};
