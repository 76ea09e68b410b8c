//! Recurring-event generation and exception-override engine.
//!
//! [`recurrence`] turns an anchor instant and a rule into occurrence instants,
//! [`occurrence`] merges them with persisted per-instance state and
//! exceptions, and [`event::EventService`] wraps it all in transactional
//! operations over a [`cadence_db::db::CalendarStore`].

pub mod error;
pub mod event;
pub mod exception;
pub mod occurrence;
pub mod recurrence;
