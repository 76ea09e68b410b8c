pub mod connection;
pub mod enums;
pub mod memory;
pub mod migrate;
pub mod postgres;
pub mod query;
pub mod schema;
pub mod store;
pub mod transaction;

pub use store::{CalendarRepository, CalendarStore, EventQuery, EventSlice, StoreTransaction};
