//! Instant normalization.
//!
//! Generated occurrence instants are matched against stored rows by exact
//! equality, so every instant is truncated to microseconds (the precision of
//! `timestamptz`) at the point where it enters the engine, and matching keys
//! compare epoch microseconds only.

use chrono::{DateTime, SubsecRound, Utc};

/// ## Summary
/// Truncates an instant to microsecond precision.
#[must_use]
pub fn normalize(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(6)
}

/// Fixed-precision matching key for an instant (epoch microseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstantKey(i64);

impl InstantKey {
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0
    }
}

impl From<DateTime<Utc>> for InstantKey {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant.timestamp_micros())
    }
}

impl From<&DateTime<Utc>> for InstantKey {
    fn from(instant: &DateTime<Utc>) -> Self {
        Self(instant.timestamp_micros())
    }
}
