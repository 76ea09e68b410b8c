//! Persistence collaborator for the cadence engine.
//!
//! Defines the store contract consumed by the service layer and ships two
//! implementations: [`db::postgres::PgStore`] over diesel-async and
//! [`db::memory::MemoryStore`] for tests and embedding.

pub mod db;
pub mod error;
pub mod model;
