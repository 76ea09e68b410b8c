//! Query composition for `event_reminder` table operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_reminder;
use crate::model::{NewReminder, Reminder};

/// ## Summary
/// Returns a query for the reminders of an event, ordered by lead time.
#[must_use]
pub fn by_event(event_id: Uuid) -> event_reminder::BoxedQuery<'static, diesel::pg::Pg> {
    event_reminder::table
        .filter(event_reminder::event_id.eq(event_id))
        .order((event_reminder::minutes_before.asc(), event_reminder::id.asc()))
        .into_boxed()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_reminder(
    conn: &mut DbConnection<'_>,
    new_reminder: &NewReminder,
) -> diesel::QueryResult<Reminder> {
    diesel::insert_into(event_reminder::table)
        .values(new_reminder)
        .returning(Reminder::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_reminder(conn: &mut DbConnection<'_>, id: Uuid) -> diesel::QueryResult<Option<Reminder>> {
    event_reminder::table
        .find(id)
        .select(Reminder::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_reminder(
    conn: &mut DbConnection<'_>,
    reminder: &Reminder,
) -> diesel::QueryResult<Reminder> {
    diesel::update(reminder)
        .set(reminder)
        .returning(Reminder::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_reminder(conn: &mut DbConnection<'_>, id: Uuid) -> diesel::QueryResult<usize> {
    diesel::delete(event_reminder::table.find(id))
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn reminders_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
) -> diesel::QueryResult<Vec<Reminder>> {
    by_event(event_id)
        .select(Reminder::as_select())
        .load(conn)
        .await
}
