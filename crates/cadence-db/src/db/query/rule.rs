//! Query composition for `recurrence_rule` table operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::recurrence_rule;
use crate::model::{NewRecurrenceRule, RecurrenceRule};

/// ## Summary
/// Returns a query for the rule of an event.
#[must_use]
pub fn by_event(event_id: Uuid) -> recurrence_rule::BoxedQuery<'static, diesel::pg::Pg> {
    recurrence_rule::table
        .filter(recurrence_rule::event_id.eq(event_id))
        .into_boxed()
}

/// ## Summary
/// Inserts a recurrence rule.
///
/// ## Errors
/// Returns a database error if the insert fails, including when the event already has a rule.
#[tracing::instrument(skip(conn, new_rule), fields(event_id = %new_rule.event_id, frequency = %new_rule.frequency))]
pub async fn create_rule(
    conn: &mut DbConnection<'_>,
    new_rule: &NewRecurrenceRule,
) -> diesel::QueryResult<RecurrenceRule> {
    diesel::insert_into(recurrence_rule::table)
        .values(new_rule)
        .returning(RecurrenceRule::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads the rule of an event, if any.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn rule_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
) -> diesel::QueryResult<Option<RecurrenceRule>> {
    by_event(event_id)
        .select(RecurrenceRule::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Saves every column of a rule.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_rule(
    conn: &mut DbConnection<'_>,
    rule: &RecurrenceRule,
) -> diesel::QueryResult<RecurrenceRule> {
    diesel::update(rule)
        .set(rule)
        .returning(RecurrenceRule::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Removes the rule of an event.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_for_event(conn: &mut DbConnection<'_>, event_id: Uuid) -> diesel::QueryResult<usize> {
    diesel::delete(recurrence_rule::table.filter(recurrence_rule::event_id.eq(event_id)))
        .execute(conn)
        .await
}
