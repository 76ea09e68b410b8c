#![allow(clippy::expect_used)]
//! Tests for windowed event listing, pagination and event deletion.

use cadence_core::config::RecurrenceConfig;
use cadence_core::types::EventKindFilter;
use cadence_db::db::memory::RowCounts;
use cadence_service::event::{DeleteMode, EventPage, ListEventsRequest};
use chrono::{DateTime, Utc};

use super::helpers::*;

fn january(page: u32, page_size: u32) -> ListEventsRequest {
    ListEventsRequest {
        owner_id: owner(),
        window_start: utc(2024, 1, 1, 0, 0),
        window_end: utc(2024, 1, 31, 23, 59),
        kind: EventKindFilter::Any,
        page,
        page_size,
    }
}

async fn list(engine: &TestEngine, request: ListEventsRequest) -> EventPage {
    engine
        .service
        .list_events(request, &never())
        .await
        .expect("Failed to list events")
}

/// Three single events on Jan 10..12 and the daily standup series from Jan 1.
async fn seed_january(engine: &TestEngine) {
    seed_standups(engine).await;
    for day in 10..=12 {
        engine
            .create(single(&format!("Meeting {day}"), utc(2024, 1, day, 15, 0)))
            .await;
    }
}

fn starts(page: &EventPage) -> Vec<DateTime<Utc>> {
    page.items.iter().map(|item| item.event.start_time).collect()
}

/// ## Summary
/// Test that pages slice the ordered result and report the full total.
#[test_log::test(tokio::test)]
async fn list_events_pages_through_window() {
    let engine = TestEngine::new();
    seed_january(&engine).await;

    let first = list(&engine, january(1, 2)).await;
    assert_eq!(first.total, 4);
    assert_eq!(first.page, 1);
    assert_eq!(
        starts(&first),
        vec![utc(2024, 1, 1, 9, 0), utc(2024, 1, 10, 15, 0)]
    );
    assert_eq!(first.items[0].occurrences.len(), 5);
    assert_eq!(first.items[1].occurrences.len(), 1);

    let second = list(&engine, january(2, 2)).await;
    assert_eq!(
        starts(&second),
        vec![utc(2024, 1, 11, 15, 0), utc(2024, 1, 12, 15, 0)]
    );

    let past_end = list(&engine, january(3, 2)).await;
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 4);
}

/// ## Summary
/// Test that the kind filter separates single and recurring events.
#[test_log::test(tokio::test)]
async fn list_events_filters_by_kind() {
    let engine = TestEngine::new();
    seed_january(&engine).await;

    let mut recurring_only = january(1, 10);
    recurring_only.kind = EventKindFilter::Recurring;
    let page = list(&engine, recurring_only).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].event.title, "Standup");

    let mut single_only = january(1, 10);
    single_only.kind = EventKindFilter::Single;
    let page = list(&engine, single_only).await;
    assert_eq!(page.total, 3);
    assert!(page.items.iter().all(|item| item.occurrences.len() == 1));
}

/// ## Summary
/// Test that single events outside the window and other owners' events are excluded.
#[test_log::test(tokio::test)]
async fn list_events_respects_window_and_owner() {
    let engine = TestEngine::new();
    seed_january(&engine).await;
    engine.create(single("February", utc(2024, 2, 3, 9, 0))).await;
    engine
        .service
        .create_event(
            single("Someone else", utc(2024, 1, 15, 9, 0)),
            uuid::Uuid::now_v7(),
            &never(),
        )
        .await
        .expect("Failed to create foreign event");

    let page = list(&engine, january(1, 10)).await;
    assert_eq!(page.total, 4);
    assert!(page.items.iter().all(|item| item.event.owner_id == owner()));
}

/// ## Summary
/// Test that an open-ended rule stops at the generation horizon on reads:
/// the last in-horizon instant is listed and later windows are empty.
#[test_log::test(tokio::test)]
async fn list_events_stops_open_ended_rules_at_horizon() {
    let engine = TestEngine::new();
    engine
        .create(recurring(
            "Payroll",
            utc(2024, 1, 25, 12, 0),
            cadence_service::recurrence::RecurrenceRequest::new("monthly"),
        ))
        .await;

    let straddling = list(
        &engine,
        ListEventsRequest {
            window_start: utc(2024, 12, 1, 0, 0),
            window_end: utc(2025, 3, 1, 0, 0),
            ..january(1, 10)
        },
    )
    .await;
    assert_eq!(straddling.total, 1);
    let occurrences = &straddling.items[0].occurrences;
    assert_eq!(start_times(occurrences), vec![utc(2024, 12, 25, 12, 0)]);
    assert!(occurrences.iter().all(|view| view.occurrence_id.is_some()));

    let beyond = list(
        &engine,
        ListEventsRequest {
            window_start: utc(2026, 3, 1, 0, 0),
            window_end: utc(2026, 4, 30, 0, 0),
            ..january(1, 10)
        },
    )
    .await;
    assert!(beyond.items.iter().all(|item| item.occurrences.is_empty()));
}

/// ## Summary
/// Test that page numbers and sizes start at one and sizes are capped.
#[test_log::test(tokio::test)]
async fn list_events_validates_and_clamps_paging() {
    let engine = TestEngine::with_config(RecurrenceConfig {
        max_page_size: 3,
        ..RecurrenceConfig::default()
    });
    seed_january(&engine).await;

    for request in [january(0, 10), january(1, 0)] {
        let err = engine
            .service
            .list_events(request, &never())
            .await
            .expect_err("Zero page or size must be rejected");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let page = list(&engine, january(1, 50)).await;
    assert_eq!(page.page_size, 3);
    assert_eq!(page.items.len(), 3);
}

/// ## Summary
/// Test that an inverted window is rejected.
#[test_log::test(tokio::test)]
async fn list_events_rejects_inverted_window() {
    let engine = TestEngine::new();

    let err = engine
        .service
        .list_events(
            ListEventsRequest {
                window_start: utc(2024, 2, 1, 0, 0),
                window_end: utc(2024, 1, 1, 0, 0),
                ..january(1, 10)
            },
            &never(),
        )
        .await
        .expect_err("Inverted window must be rejected");

    assert_eq!(err.kind(), ErrorKind::Validation);
}

/// ## Summary
/// Test that a soft-deleted event disappears from reads but keeps its rows.
#[test_log::test(tokio::test)]
async fn soft_delete_hides_event() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;

    engine
        .service
        .delete_event(created.event.id, DeleteMode::Soft, &never())
        .await
        .expect("Failed to delete event");

    let err = engine
        .service
        .get_event(created.event.id, &never())
        .await
        .expect_err("Deleted event must be hidden");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = engine
        .service
        .list_occurrences(
            created.event.id,
            utc(2024, 1, 1, 0, 0),
            utc(2024, 1, 31, 0, 0),
            &never(),
        )
        .await
        .expect_err("Deleted event has no occurrences");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(list(&engine, january(1, 10)).await.total, 0);
    assert_eq!(engine.store.row_counts().occurrences, 5);

    let err = engine
        .service
        .delete_event(created.event.id, DeleteMode::Soft, &never())
        .await
        .expect_err("Second soft delete must fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// ## Summary
/// Test that a hard delete removes the event with everything attached to it.
#[test_log::test(tokio::test)]
async fn hard_delete_cascades() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;
    engine
        .service
        .delete_occurrence(created.event.id, utc(2024, 1, 2, 9, 0), &never())
        .await
        .expect("Failed to delete occurrence");

    engine
        .service
        .delete_event(created.event.id, DeleteMode::Hard, &never())
        .await
        .expect("Failed to delete event");

    assert_eq!(engine.store.row_counts(), RowCounts::default());

    let err = engine
        .service
        .delete_event(created.event.id, DeleteMode::Hard, &never())
        .await
        .expect_err("Event is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
