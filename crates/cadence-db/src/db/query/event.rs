//! Query composition for `calendar_event` table operations.

use cadence_core::types::EventKindFilter;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::{calendar_event, recurrence_rule};
use crate::db::store::{EventQuery, EventSlice};
use crate::model::{Event, NewEvent};

type BoxedEventQuery = calendar_event::BoxedQuery<'static, diesel::pg::Pg>;

/// ## Summary
/// Returns a query for all events, including soft-deleted ones.
#[must_use]
pub fn all() -> BoxedEventQuery {
    calendar_event::table.into_boxed()
}

/// ## Summary
/// Returns a query for an event by ID.
#[must_use]
pub fn by_id(id: Uuid) -> BoxedEventQuery {
    all().filter(calendar_event::id.eq(id))
}

/// ## Summary
/// Returns a query for the live events of an owner.
#[must_use]
pub fn by_owner_not_deleted(owner_id: Uuid) -> BoxedEventQuery {
    all()
        .filter(calendar_event::owner_id.eq(owner_id))
        .filter(calendar_event::deleted_at.is_null())
}

fn rule_owners() -> diesel::dsl::Select<recurrence_rule::table, recurrence_rule::event_id> {
    recurrence_rule::table.select(recurrence_rule::event_id)
}

/// ## Summary
/// Returns a query for the live events of an owner visible in a window.
///
/// Non-recurring events must overlap the window. Recurring events only need
/// to start before the window ends, since their occurrences run past `end_time`.
#[must_use]
pub fn in_window(query: &EventQuery) -> BoxedEventQuery {
    let base = by_owner_not_deleted(query.owner_id)
        .filter(calendar_event::start_time.le(query.window_end))
        .filter(
            calendar_event::id
                .eq_any(rule_owners())
                .or(calendar_event::end_time.ge(query.window_start)),
        );

    match query.kind {
        EventKindFilter::Any => base,
        EventKindFilter::Single => base.filter(diesel::dsl::not(
            calendar_event::id.eq_any(rule_owners()),
        )),
        EventKindFilter::Recurring => base.filter(calendar_event::id.eq_any(rule_owners())),
    }
}

/// ## Summary
/// Returns the ordered page of [`in_window`] selected by `offset` and `limit`.
#[must_use]
pub fn page_in_window(query: &EventQuery) -> BoxedEventQuery {
    in_window(query)
        .order((calendar_event::start_time.asc(), calendar_event::id.asc()))
        .offset(query.offset)
        .limit(query.limit)
}

/// ## Summary
/// Inserts a new event and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails.
#[tracing::instrument(skip(conn, new_event), fields(event_id = %new_event.id, owner_id = %new_event.owner_id))]
pub async fn create_event(
    conn: &mut DbConnection<'_>,
    new_event: &NewEvent,
) -> diesel::QueryResult<Event> {
    tracing::debug!("Creating calendar event");

    diesel::insert_into(calendar_event::table)
        .values(new_event)
        .returning(Event::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads an event by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_event(conn: &mut DbConnection<'_>, id: Uuid) -> diesel::QueryResult<Option<Event>> {
    by_id(id)
        .select(Event::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Saves every column of an event.
///
/// ## Errors
/// Returns a database error if the update fails or the event does not exist.
#[tracing::instrument(skip(conn, event), fields(event_id = %event.id))]
pub async fn update_event(conn: &mut DbConnection<'_>, event: &Event) -> diesel::QueryResult<Event> {
    diesel::update(event)
        .set(event)
        .returning(Event::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Hard deletes an event. Rules, occurrences, exceptions and reminders cascade.
///
/// ## Errors
/// Returns a database error if the delete fails.
#[tracing::instrument(skip(conn))]
pub async fn delete_event(conn: &mut DbConnection<'_>, id: Uuid) -> diesel::QueryResult<usize> {
    diesel::delete(calendar_event::table.filter(calendar_event::id.eq(id)))
        .execute(conn)
        .await
}

/// ## Summary
/// Loads one page of events visible in a window, plus the total match count.
///
/// ## Errors
/// Returns a database error if either query fails.
#[tracing::instrument(skip(conn, query), fields(owner_id = %query.owner_id, kind = ?query.kind))]
pub async fn list_events(
    conn: &mut DbConnection<'_>,
    query: &EventQuery,
) -> diesel::QueryResult<EventSlice> {
    let total = in_window(query).count().get_result::<i64>(conn).await?;
    let events = page_in_window(query)
        .select(Event::as_select())
        .load(conn)
        .await?;

    tracing::trace!(total, page_len = events.len(), "Listed events");

    Ok(EventSlice { events, total })
}
