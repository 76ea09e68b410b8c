//! Models for the `event_reminder` table.

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use crate::db::{enums::ReminderMethod, schema};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = schema::event_reminder)]
#[diesel(check_for_backend(Pg))]
pub struct Reminder {
    pub id: Uuid,
    pub event_id: Uuid,
    pub minutes_before: i32,
    pub method: ReminderMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_reminder)]
pub struct NewReminder {
    pub id: Uuid,
    pub event_id: Uuid,
    pub minutes_before: i32,
    pub method: ReminderMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewReminder {
    #[must_use]
    pub fn into_row(self) -> Reminder {
        Reminder {
            id: self.id,
            event_id: self.event_id,
            minutes_before: self.minutes_before,
            method: self.method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
