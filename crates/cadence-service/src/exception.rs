//! Exception store access: keyed lookup, creation and patching of
//! per-instance overrides.
//!
//! An exception is keyed by `(event_id, original_time)`, where
//! `original_time` is always the generated instant of the occurrence it
//! overrides. Deletion is itself an override flag; rows are never removed.

use cadence_core::time::normalize;
use cadence_core::types::Transparency;
use cadence_db::db::CalendarRepository;
use cadence_db::error::DbResult;
use cadence_db::model::{EventException, NewEventException};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Partial override of a single occurrence. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrencePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Option<Transparency>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl OccurrencePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with every instant truncated to storage precision.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.start_time = self.start_time.map(normalize);
        self.end_time = self.end_time.map(normalize);
        self
    }
}

/// ## Summary
/// Loads the exception for `(event_id, original_time)`, creating an empty one if none exists.
///
/// A known `occurrence_id` is recorded as the exception's backlink; the
/// caller persists it with its other changes.
///
/// ## Errors
/// Returns a store error if the lookup or insert fails.
pub async fn find_or_create<R>(
    repo: &mut R,
    event_id: Uuid,
    original_time: DateTime<Utc>,
    occurrence_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> DbResult<EventException>
where
    R: CalendarRepository + ?Sized,
{
    if let Some(mut existing) = repo.exception_by_original_time(event_id, original_time).await? {
        if existing.occurrence_id.is_none() {
            existing.occurrence_id = occurrence_id;
        }
        return Ok(existing);
    }

    tracing::trace!(%event_id, %original_time, "Creating exception");
    repo.insert_exception(&NewEventException::blank(
        event_id,
        original_time,
        occurrence_id,
        now,
    ))
    .await
}

/// Writes every set field of `patch` onto `exception`.
pub fn apply_patch(exception: &mut EventException, patch: &OccurrencePatch, now: DateTime<Utc>) {
    if patch.title.is_some() {
        exception.title.clone_from(&patch.title);
    }
    if patch.description.is_some() {
        exception.description.clone_from(&patch.description);
    }
    if patch.location.is_some() {
        exception.location.clone_from(&patch.location);
    }
    if patch.color.is_some() {
        exception.color.clone_from(&patch.color);
    }
    if patch.transparency.is_some() {
        exception.transparency = patch.transparency.map(Into::into);
    }
    if patch.start_time.is_some() {
        exception.start_time = patch.start_time;
    }
    if patch.end_time.is_some() {
        exception.end_time = patch.end_time;
    }
    exception.updated_at = now;
}

/// ## Summary
/// Moves the override instants of `exception` by `delta`.
///
/// Exceptions without an override start or end are untouched, since they
/// follow the regenerated instant on their own. Returns whether anything moved.
pub fn shift_overrides(exception: &mut EventException, delta: TimeDelta, now: DateTime<Utc>) -> bool {
    if delta.is_zero() || !exception.has_time_override() {
        return false;
    }
    exception.start_time = exception.start_time.map(|start| start + delta);
    exception.end_time = exception.end_time.map(|end| end + delta);
    exception.updated_at = now;
    true
}

/// ## Summary
/// Re-keys `exception` onto the instant its occurrence regenerates at after
/// the anchor moved by `delta`, and moves its override instants with it.
///
/// `occurrence_id` is the materialized row at the new instant, if any.
/// Returns whether override instants moved.
pub fn follow_anchor(
    exception: &mut EventException,
    delta: TimeDelta,
    occurrence_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> bool {
    exception.original_time += delta;
    exception.occurrence_id = occurrence_id;
    exception.updated_at = now;
    shift_overrides(exception, delta, now)
}

/// ## Summary
/// Marks the occurrence at `(event_id, original_time)` deleted.
///
/// Idempotent: an exception that is already deleted is returned unchanged.
///
/// ## Errors
/// Returns a store error if any lookup or write fails.
pub async fn mark_deleted<R>(
    repo: &mut R,
    event_id: Uuid,
    original_time: DateTime<Utc>,
    occurrence_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> DbResult<EventException>
where
    R: CalendarRepository + ?Sized,
{
    let mut exception = find_or_create(repo, event_id, original_time, occurrence_id, now).await?;
    if exception.is_deleted {
        tracing::debug!(exception_id = %exception.id, "Occurrence already deleted");
        return Ok(exception);
    }
    exception.is_deleted = true;
    exception.updated_at = now;
    repo.update_exception(&exception).await
}
