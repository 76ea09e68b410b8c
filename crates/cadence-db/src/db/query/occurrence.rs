//! Query composition for `event_occurrence` table operations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::OccurrenceStatus;
use crate::db::schema::event_occurrence;
use crate::model::{NewOccurrence, Occurrence};

/// Rows per insert statement, well under the bind parameter limit.
const INSERT_CHUNK: usize = 1000;

type BoxedOccurrenceQuery = event_occurrence::BoxedQuery<'static, diesel::pg::Pg>;

/// ## Summary
/// Returns a query for the occurrences of an event.
#[must_use]
pub fn by_event(event_id: Uuid) -> BoxedOccurrenceQuery {
    event_occurrence::table
        .filter(event_occurrence::event_id.eq(event_id))
        .into_boxed()
}

/// ## Summary
/// Returns a query for the occurrences of an event in `[start, end]`, ascending.
#[must_use]
pub fn by_event_and_range(
    event_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BoxedOccurrenceQuery {
    by_event(event_id)
        .filter(event_occurrence::occurrence_time.ge(start))
        .filter(event_occurrence::occurrence_time.le(end))
        .order(event_occurrence::occurrence_time.asc())
}

/// ## Summary
/// Batch inserts occurrences, skipping instants that already have a row.
///
/// ## Errors
/// Returns a database error if an insert fails.
#[tracing::instrument(skip(conn, occurrences), fields(count = occurrences.len()))]
pub async fn insert_occurrences(
    conn: &mut DbConnection<'_>,
    occurrences: &[NewOccurrence],
) -> diesel::QueryResult<usize> {
    let mut written = 0;
    for chunk in occurrences.chunks(INSERT_CHUNK) {
        written += diesel::insert_into(event_occurrence::table)
            .values(chunk)
            .on_conflict((event_occurrence::event_id, event_occurrence::occurrence_time))
            .do_nothing()
            .execute(conn)
            .await?;
    }

    tracing::trace!(written, "Occurrences inserted");

    Ok(written)
}

/// ## Summary
/// Loads an occurrence by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_occurrence(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> diesel::QueryResult<Option<Occurrence>> {
    event_occurrence::table
        .find(id)
        .select(Occurrence::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the occurrences of an event in `[start, end]`.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn occurrences_in_range(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> diesel::QueryResult<Vec<Occurrence>> {
    by_event_and_range(event_id, start, end)
        .select(Occurrence::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Sets the status of an occurrence.
///
/// ## Errors
/// Returns a database error if the update fails.
#[tracing::instrument(skip(conn))]
pub async fn update_status(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    status: OccurrenceStatus,
    updated_at: DateTime<Utc>,
) -> diesel::QueryResult<Option<Occurrence>> {
    diesel::update(event_occurrence::table.find(id))
        .set((
            event_occurrence::status.eq(status),
            event_occurrence::updated_at.eq(updated_at),
        ))
        .returning(Occurrence::as_returning())
        .get_result(conn)
        .await
        .optional()
}
