use std::collections::HashMap;

use cadence_core::time::InstantKey;
use cadence_core::types::OccurrenceStatus;
use cadence_db::model::Occurrence;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A generated occurrence, carrying persisted state when a row exists for its instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedOccurrence {
    /// Row id, or `None` for an instant that has no row yet.
    pub id: Option<Uuid>,
    pub event_id: Uuid,
    pub occurrence_time: DateTime<Utc>,
    pub status: OccurrenceStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MaterializedOccurrence {
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// ## Summary
/// Pairs generated candidate instants with persisted occurrence rows.
///
/// Candidates drive the output: a row whose instant is no longer generated is
/// ignored, and a candidate without a row becomes a transient upcoming
/// occurrence. Matching compares [`InstantKey`]s.
#[must_use]
pub fn materialize(
    event_id: Uuid,
    candidates: &[DateTime<Utc>],
    rows: Vec<Occurrence>,
) -> Vec<MaterializedOccurrence> {
    let mut by_instant: HashMap<InstantKey, Occurrence> = rows
        .into_iter()
        .map(|row| (InstantKey::from(&row.occurrence_time), row))
        .collect();

    let materialized: Vec<MaterializedOccurrence> = candidates
        .iter()
        .map(|&instant| match by_instant.remove(&InstantKey::from(instant)) {
            Some(row) => MaterializedOccurrence {
                id: Some(row.id),
                event_id,
                occurrence_time: instant,
                status: row.status.into(),
                created_at: Some(row.created_at),
                updated_at: Some(row.updated_at),
            },
            None => MaterializedOccurrence {
                id: None,
                event_id,
                occurrence_time: instant,
                status: OccurrenceStatus::Upcoming,
                created_at: None,
                updated_at: None,
            },
        })
        .collect();

    tracing::trace!(
        candidates = candidates.len(),
        persisted = materialized.iter().filter(|o| o.is_persisted()).count(),
        stale = by_instant.len(),
        "Materialized occurrences"
    );

    materialized
}
