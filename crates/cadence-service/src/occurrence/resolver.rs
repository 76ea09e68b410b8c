use std::collections::HashMap;

use cadence_core::time::InstantKey;
use cadence_core::types::{OccurrenceStatus, Transparency};
use cadence_db::model::{Event, EventException};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::MaterializedOccurrence;

/// Caller-visible occurrence after exception overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceView {
    pub occurrence_id: Option<Uuid>,
    pub event_id: Uuid,
    /// Generated instant; the key of any exception for this occurrence.
    pub original_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Transparency,
    pub is_all_day: bool,
    pub status: OccurrenceStatus,
    pub exception_id: Option<Uuid>,
}

impl OccurrenceView {
    fn from_event(event: &Event, occurrence: MaterializedOccurrence) -> Self {
        let start_time = occurrence.occurrence_time;
        Self {
            occurrence_id: occurrence.id,
            event_id: event.id,
            original_time: start_time,
            start_time,
            end_time: start_time + event.duration(),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            color: event.color.clone(),
            transparency: event.transparency.into(),
            is_all_day: event.is_all_day,
            status: occurrence.status,
            exception_id: None,
        }
    }

    fn apply(&mut self, event: &Event, exception: &EventException) {
        self.exception_id = Some(exception.id);
        if let Some(title) = &exception.title {
            self.title.clone_from(title);
        }
        if exception.description.is_some() {
            self.description.clone_from(&exception.description);
        }
        if exception.location.is_some() {
            self.location.clone_from(&exception.location);
        }
        if exception.color.is_some() {
            self.color.clone_from(&exception.color);
        }
        if let Some(transparency) = exception.transparency {
            self.transparency = transparency.into();
        }
        let (start_time, end_time) = effective_times(event, self.original_time, exception);
        self.start_time = start_time;
        self.end_time = end_time;
    }
}

/// ## Summary
/// Start and end of one occurrence after time overrides.
///
/// An overridden start without an overridden end keeps the event's duration.
#[must_use]
pub fn effective_times(
    event: &Event,
    original_time: DateTime<Utc>,
    exception: &EventException,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_time = exception.start_time.unwrap_or(original_time);
    let end_time = exception
        .end_time
        .unwrap_or_else(|| start_time + event.duration());
    (start_time, end_time)
}

/// ## Summary
/// Merges materialized occurrences with the exceptions of their event.
///
/// Deleted occurrences are dropped and overrides replace the event's values
/// field by field. Output is ordered by effective start; occurrences that
/// start together keep their generated order.
#[must_use]
pub fn resolve(
    event: &Event,
    occurrences: Vec<MaterializedOccurrence>,
    exceptions: &[EventException],
) -> Vec<OccurrenceView> {
    let by_original: HashMap<InstantKey, &EventException> = exceptions
        .iter()
        .map(|exception| (InstantKey::from(&exception.original_time), exception))
        .collect();

    let mut views: Vec<OccurrenceView> = occurrences
        .into_iter()
        .filter_map(|occurrence| {
            let exception = by_original
                .get(&InstantKey::from(&occurrence.occurrence_time))
                .copied();
            if exception.is_some_and(|exception| exception.is_deleted) {
                return None;
            }
            let mut view = OccurrenceView::from_event(event, occurrence);
            if let Some(exception) = exception {
                view.apply(event, exception);
            }
            Some(view)
        })
        .collect();

    views.sort_by_key(|view| view.start_time);
    views
}

/// The single occurrence of a non-recurring event.
#[must_use]
pub fn single_view(event: &Event) -> OccurrenceView {
    OccurrenceView::from_event(
        event,
        MaterializedOccurrence {
            id: None,
            event_id: event.id,
            occurrence_time: event.start_time,
            status: OccurrenceStatus::Upcoming,
            created_at: None,
            updated_at: None,
        },
    )
}
