//! Query composition for `event_exception` table operations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_exception;
use crate::model::{EventException, NewEventException};

type BoxedExceptionQuery = event_exception::BoxedQuery<'static, diesel::pg::Pg>;

/// ## Summary
/// Returns a query for the exceptions of an event.
#[must_use]
pub fn by_event(event_id: Uuid) -> BoxedExceptionQuery {
    event_exception::table
        .filter(event_exception::event_id.eq(event_id))
        .into_boxed()
}

/// ## Summary
/// Returns a query for the exception keyed by `(event_id, original_time)`.
#[must_use]
pub fn by_key(event_id: Uuid, original_time: DateTime<Utc>) -> BoxedExceptionQuery {
    by_event(event_id).filter(event_exception::original_time.eq(original_time))
}

/// ## Summary
/// Returns a query for the exception linked to an occurrence row.
#[must_use]
pub fn by_occurrence(occurrence_id: Uuid) -> BoxedExceptionQuery {
    event_exception::table
        .filter(event_exception::occurrence_id.eq(occurrence_id))
        .into_boxed()
}

/// ## Summary
/// Returns a query for exceptions whose original instant lies in `[start, end]`.
#[must_use]
pub fn by_event_and_range(
    event_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BoxedExceptionQuery {
    by_event(event_id)
        .filter(event_exception::original_time.ge(start))
        .filter(event_exception::original_time.le(end))
        .order(event_exception::original_time.asc())
}

/// ## Summary
/// Inserts an exception.
///
/// ## Errors
/// Returns a database error if the insert fails, including a duplicate key.
#[tracing::instrument(skip(conn, new_exception), fields(event_id = %new_exception.event_id, original_time = %new_exception.original_time))]
pub async fn create_exception(
    conn: &mut DbConnection<'_>,
    new_exception: &NewEventException,
) -> diesel::QueryResult<EventException> {
    diesel::insert_into(event_exception::table)
        .values(new_exception)
        .returning(EventException::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Saves every column of an exception.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_exception(
    conn: &mut DbConnection<'_>,
    exception: &EventException,
) -> diesel::QueryResult<EventException> {
    diesel::update(exception)
        .set(exception)
        .returning(EventException::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads the exception keyed by `(event_id, original_time)`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_by_key(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
    original_time: DateTime<Utc>,
) -> diesel::QueryResult<Option<EventException>> {
    by_key(event_id, original_time)
        .select(EventException::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the exceptions of an event in `[start, end]`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn exceptions_in_range(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> diesel::QueryResult<Vec<EventException>> {
    by_event_and_range(event_id, start, end)
        .select(EventException::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Loads the exception linked to an occurrence row.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_by_occurrence(
    conn: &mut DbConnection<'_>,
    occurrence_id: Uuid,
) -> diesel::QueryResult<Option<EventException>> {
    by_occurrence(occurrence_id)
        .select(EventException::as_select())
        .first(conn)
        .await
        .optional()
}
