//! Models for the `recurrence_rule` table.

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use crate::db::{enums::Frequency, schema};

/// Stored recurrence rule. At most one exists per event.
///
/// Filters are kept as raw columns; `by_day` holds two-letter weekday codes.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = schema::recurrence_rule)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub event_id: Uuid,
    pub frequency: Frequency,
    pub step_interval: i32,
    pub by_day: Vec<String>,
    pub by_month: Vec<i32>,
    pub by_month_day: Vec<i32>,
    pub max_count: Option<i32>,
    pub until_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert struct for creating new recurrence rules
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::recurrence_rule)]
pub struct NewRecurrenceRule {
    pub id: Uuid,
    pub event_id: Uuid,
    pub frequency: Frequency,
    pub step_interval: i32,
    pub by_day: Vec<String>,
    pub by_month: Vec<i32>,
    pub by_month_day: Vec<i32>,
    pub max_count: Option<i32>,
    pub until_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewRecurrenceRule {
    #[must_use]
    pub fn into_row(self) -> RecurrenceRule {
        RecurrenceRule {
            id: self.id,
            event_id: self.event_id,
            frequency: self.frequency,
            step_interval: self.step_interval,
            by_day: self.by_day,
            by_month: self.by_month,
            by_month_day: self.by_month_day,
            max_count: self.max_count,
            until_time: self.until_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
