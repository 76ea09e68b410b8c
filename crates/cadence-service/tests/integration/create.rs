#![allow(clippy::expect_used)]
//! Tests for event creation: eager materialization, validation and atomicity.

use cadence_core::types::ReminderMethod;
use cadence_db::db::memory::RowCounts;
use cadence_service::event::ReminderRequest;
use cadence_service::recurrence::RecurrenceRequest;
use chrono::TimeDelta;

use super::helpers::*;

/// ## Summary
/// Test that a recurring event persists its rule and one upcoming row per generated instant.
#[test_log::test(tokio::test)]
async fn create_recurring_event_materializes_occurrences() {
    let engine = TestEngine::new();

    let created = seed_standups(&engine).await;

    assert!(created.rule.is_some());
    assert_eq!(created.occurrences_created, 5);
    assert!(!created.truncated);
    assert_eq!(
        engine.store.row_counts(),
        RowCounts {
            events: 1,
            rules: 1,
            occurrences: 5,
            exceptions: 0,
            reminders: 0,
        }
    );

    let views = engine
        .occurrences(created.event.id, utc(2024, 1, 1, 0, 0), utc(2024, 1, 31, 0, 0))
        .await;
    assert_eq!(views.len(), 5);
    assert!(views.iter().all(|view| view.occurrence_id.is_some()));
}

/// ## Summary
/// Test that a non-recurring event writes no rule or occurrence rows and
/// still lists as a single synthesized occurrence.
#[test_log::test(tokio::test)]
async fn create_single_event_lists_one_transient_occurrence() {
    let engine = TestEngine::new();

    let created = engine.create(single("Dentist", utc(2024, 2, 5, 14, 0))).await;

    assert!(created.rule.is_none());
    assert_eq!(created.occurrences_created, 0);
    assert_eq!(engine.store.row_counts().occurrences, 0);

    let views = engine
        .occurrences(created.event.id, utc(2024, 2, 5, 0, 0), utc(2024, 2, 6, 0, 0))
        .await;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].occurrence_id, None);
    assert_eq!(views[0].start_time, utc(2024, 2, 5, 14, 0));
    assert_eq!(views[0].end_time, utc(2024, 2, 5, 15, 0));

    let outside = engine
        .occurrences(created.event.id, utc(2024, 3, 1, 0, 0), utc(2024, 3, 2, 0, 0))
        .await;
    assert!(outside.is_empty());
}

/// ## Summary
/// Test that an event ending before it starts is rejected without writing anything.
#[test_log::test(tokio::test)]
async fn create_with_end_before_start_leaves_no_rows() {
    let engine = TestEngine::new();
    let start = utc(2024, 1, 1, 10, 0);
    let mut request = recurring("Backwards", start, daily(3));
    request.end_time = start - TimeDelta::hours(1);

    let err = engine
        .service
        .create_event(request, owner(), &never())
        .await
        .expect_err("End before start must be rejected");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that malformed rules are validation errors and leave storage empty.
#[test_log::test(tokio::test)]
async fn create_with_invalid_rule_leaves_no_rows() {
    let engine = TestEngine::new();

    let mut zero_interval = daily(3);
    zero_interval.interval = 0;

    let mut both_terminators = daily(3);
    both_terminators.until = Some(utc(2024, 2, 1, 0, 0));

    let mut by_day_on_daily = daily(3);
    by_day_on_daily.by_day = vec!["MO".into()];

    let mut bad_weekday = RecurrenceRequest::new("weekly");
    bad_weekday.by_day = vec!["Monday".into()];

    let mut bad_month_day = RecurrenceRequest::new("monthly");
    bad_month_day.by_month_day = vec![32];

    for rule in [
        RecurrenceRequest::new("hourly"),
        zero_interval,
        both_terminators,
        by_day_on_daily,
        bad_weekday,
        bad_month_day,
    ] {
        let err = engine
            .service
            .create_event(
                recurring("Invalid", utc(2024, 1, 1, 9, 0), rule.clone()),
                owner(),
                &never(),
            )
            .await
            .expect_err("Invalid rule must be rejected");
        assert_eq!(err.kind(), ErrorKind::Validation, "rule {rule:?}");
    }

    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that a blank title is rejected.
#[test_log::test(tokio::test)]
async fn create_with_blank_title_is_rejected() {
    let engine = TestEngine::new();

    let err = engine
        .service
        .create_event(single("   ", utc(2024, 1, 1, 9, 0)), owner(), &never())
        .await
        .expect_err("Blank title must be rejected");

    assert_eq!(err.kind(), ErrorKind::Validation);
}

/// ## Summary
/// Test that a storage failure while materializing rolls back the event and its rule.
#[test_log::test(tokio::test)]
async fn create_rolls_back_when_materialization_fails() {
    let engine = TestEngine::new();
    engine.store.fail_on("insert_occurrences");

    let err = engine
        .service
        .create_event(
            recurring("Doomed", utc(2024, 1, 1, 9, 0), daily(5)),
            owner(),
            &never(),
        )
        .await
        .expect_err("Injected failure must surface");

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that a storage failure on commit leaves nothing behind.
#[test_log::test(tokio::test)]
async fn create_commit_failure_leaves_no_rows() {
    let engine = TestEngine::new();
    engine.store.fail_on("commit");

    let err = engine
        .service
        .create_event(single("Unlucky", utc(2024, 1, 1, 9, 0)), owner(), &never())
        .await
        .expect_err("Commit failure must surface");

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that a count the horizon cannot reach is flagged rather than silently shortened.
#[test_log::test(tokio::test)]
async fn create_with_count_past_horizon_reports_truncation() {
    let engine = TestEngine::new();

    let created = engine
        .create(recurring("Marathon", utc(2024, 1, 1, 6, 0), daily(400)))
        .await;

    assert!(created.truncated);
    assert_eq!(created.occurrences_created, 366);
}

/// ## Summary
/// Test that reminders are created with the event and returned by `get_event`.
#[test_log::test(tokio::test)]
async fn create_with_reminders_and_fetch_details() {
    let engine = TestEngine::new();
    let mut request = recurring("Review", utc(2024, 1, 1, 9, 0), daily(2));
    request.reminders = vec![
        ReminderRequest {
            minutes_before: 10,
            method: ReminderMethod::Notification,
        },
        ReminderRequest {
            minutes_before: 1440,
            method: ReminderMethod::Email,
        },
    ];

    let created = engine.create(request).await;
    assert_eq!(created.reminders.len(), 2);

    let details = engine
        .service
        .get_event(created.event.id, &never())
        .await
        .expect("Failed to get event");
    assert_eq!(details.event.title, "Review");
    assert_eq!(details.rule.map(|rule| rule.id), created.rule.map(|rule| rule.id));
    assert_eq!(details.reminders.len(), 2);
}

/// ## Summary
/// Test that a negative reminder lead time rejects the whole event.
#[test_log::test(tokio::test)]
async fn create_with_negative_reminder_leaves_no_rows() {
    let engine = TestEngine::new();
    let mut request = single("Late reminder", utc(2024, 1, 1, 9, 0));
    request.reminders = vec![ReminderRequest {
        minutes_before: -5,
        method: ReminderMethod::Notification,
    }];

    let err = engine
        .service
        .create_event(request, owner(), &never())
        .await
        .expect_err("Negative lead time must be rejected");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that sub-microsecond input is normalized so reads match persisted rows.
#[test_log::test(tokio::test)]
async fn create_normalizes_instants_to_storage_precision() {
    let engine = TestEngine::new();
    let anchor = utc(2024, 1, 1, 9, 0) + TimeDelta::nanoseconds(1_500);

    let created = engine.create(recurring("Precise", anchor, daily(3))).await;
    assert_eq!(
        created.event.start_time,
        utc(2024, 1, 1, 9, 0) + TimeDelta::microseconds(1)
    );

    let views = engine
        .occurrences(created.event.id, utc(2024, 1, 1, 0, 0), utc(2024, 1, 4, 0, 0))
        .await;
    assert_eq!(views.len(), 3);
    assert!(views.iter().all(|view| view.occurrence_id.is_some()));
}
