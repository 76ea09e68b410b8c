//! Models for the `event_occurrence` table.

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use crate::db::{enums::OccurrenceStatus, schema};

/// Materialized occurrence of a recurring event.
///
/// Carries only per-instance mutable state; timing always comes from the rule.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::event_occurrence)]
#[diesel(check_for_backend(Pg))]
pub struct Occurrence {
    pub id: Uuid,
    pub event_id: Uuid,
    /// Generated instant, unique per event.
    pub occurrence_time: DateTime<Utc>,
    pub status: OccurrenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New occurrence for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_occurrence)]
pub struct NewOccurrence {
    pub id: Uuid,
    pub event_id: Uuid,
    pub occurrence_time: DateTime<Utc>,
    pub status: OccurrenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewOccurrence {
    /// Creates an upcoming occurrence at `occurrence_time`.
    #[must_use]
    pub fn upcoming(event_id: Uuid, occurrence_time: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_id,
            occurrence_time,
            status: OccurrenceStatus::Upcoming,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn into_row(self) -> Occurrence {
        Occurrence {
            id: self.id,
            event_id: self.event_id,
            occurrence_time: self.occurrence_time,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
