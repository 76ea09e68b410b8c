#![allow(clippy::expect_used)]
//! Shared recurrence cases, checked against the generator and end to end
//! through event creation and occurrence listing.

use cadence_service::event::CreateEventRequest;
use cadence_service::recurrence::{Generator, RecurrenceRequest, Rule};
use chrono::TimeDelta;

use super::helpers::{TestEngine, start_times};

include!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/recurrence_cases_data/mod.rs"
));

/// ## Summary
/// Integration-level validation of the generator using shared cases.
#[test_log::test(tokio::test)]
async fn recurrence_cases_integration() {
    for case in recurrence_cases() {
        assert_case(&case);
    }
}

/// ## Summary
/// Test that listing a freshly created event yields exactly the expected
/// instants, each backed by a materialized row.
#[test_log::test(tokio::test)]
async fn recurrence_cases_through_service() {
    let engine = TestEngine::new();

    for case in recurrence_cases() {
        let Some(expected) = case.expected else {
            continue;
        };
        let expected: Vec<DateTime<Utc>> = expected.iter().map(|value| parse_rfc3339(value)).collect();

        let anchor = case.anchor();
        let mut request =
            CreateEventRequest::new(case.name, anchor, anchor + TimeDelta::minutes(30));
        request.recurrence = Some(case.request());
        let created = engine.create(request).await;
        assert_eq!(created.occurrences_created, expected.len(), "Case {}", case.name);

        let window_end = expected.last().copied().unwrap_or(anchor);
        let views = engine.occurrences(created.event.id, anchor, window_end).await;
        assert_eq!(start_times(&views), expected, "Case {} did not match", case.name);
        assert!(
            views.iter().all(|view| view.occurrence_id.is_some()),
            "Case {} has unmaterialized occurrences",
            case.name
        );
    }
}
