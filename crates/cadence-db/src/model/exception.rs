//! Models for the `event_exception` table.

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use crate::db::{enums::Transparency, schema};

/// Per-instance override or soft deletion of a recurring event.
///
/// Keyed by `(event_id, original_time)`, where `original_time` is the
/// generated instant and never an overridden one. Unset override fields fall
/// back to the parent event.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = schema::event_exception)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EventException {
    pub id: Uuid,
    pub event_id: Uuid,
    pub original_time: DateTime<Utc>,
    pub occurrence_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Option<Transparency>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventException {
    /// Whether an override start or end instant is set.
    #[must_use]
    pub const fn has_time_override(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

/// Insert struct for creating new exceptions
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_exception)]
pub struct NewEventException {
    pub id: Uuid,
    pub event_id: Uuid,
    pub original_time: DateTime<Utc>,
    pub occurrence_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Option<Transparency>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewEventException {
    /// Creates an exception with no overrides set.
    #[must_use]
    pub fn blank(
        event_id: Uuid,
        original_time: DateTime<Utc>,
        occurrence_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_id,
            original_time,
            occurrence_id,
            title: None,
            description: None,
            location: None,
            color: None,
            transparency: None,
            start_time: None,
            end_time: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn into_row(self) -> EventException {
        EventException {
            id: self.id,
            event_id: self.event_id,
            original_time: self.original_time,
            occurrence_id: self.occurrence_id,
            title: self.title,
            description: self.description,
            location: self.location,
            color: self.color,
            transparency: self.transparency,
            start_time: self.start_time,
            end_time: self.end_time,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
