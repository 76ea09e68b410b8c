#![allow(clippy::expect_used)]
//! Tests for reminder management.

use cadence_core::types::ReminderMethod;
use cadence_db::db::enums;
use cadence_service::event::{DeleteMode, ReminderPatch, ReminderRequest};

use super::helpers::*;

fn notify(minutes_before: i64) -> ReminderRequest {
    ReminderRequest {
        minutes_before,
        method: ReminderMethod::Notification,
    }
}

/// ## Summary
/// Test the add, update and delete lifecycle of a reminder.
#[test_log::test(tokio::test)]
async fn reminder_lifecycle() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;

    let reminder = engine
        .service
        .add_reminder(created.event.id, notify(15), &never())
        .await
        .expect("Failed to add reminder");
    assert_eq!(reminder.minutes_before, 15);
    assert_eq!(reminder.method, enums::ReminderMethod::Notification);

    let updated = engine
        .service
        .update_reminder(
            reminder.id,
            ReminderPatch {
                method: Some(ReminderMethod::Email),
                ..ReminderPatch::default()
            },
            &never(),
        )
        .await
        .expect("Failed to update reminder");
    assert_eq!(updated.minutes_before, 15);
    assert_eq!(updated.method, enums::ReminderMethod::Email);

    let details = engine
        .service
        .get_event(created.event.id, &never())
        .await
        .expect("Failed to get event");
    assert_eq!(details.reminders, vec![updated]);

    engine
        .service
        .delete_reminder(reminder.id, &never())
        .await
        .expect("Failed to delete reminder");
    assert_eq!(engine.store.row_counts().reminders, 0);

    let err = engine
        .service
        .delete_reminder(reminder.id, &never())
        .await
        .expect_err("Reminder is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// ## Summary
/// Test that invalid lead times and empty patches are validation errors.
#[test_log::test(tokio::test)]
async fn reminder_validation() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;

    for minutes_before in [-1, i64::from(i32::MAX) + 1] {
        let err = engine
            .service
            .add_reminder(created.event.id, notify(minutes_before), &never())
            .await
            .expect_err("Out-of-range lead time must be rejected");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let reminder = engine
        .service
        .add_reminder(created.event.id, notify(0), &never())
        .await
        .expect("Zero lead time is allowed");

    let err = engine
        .service
        .update_reminder(reminder.id, ReminderPatch::default(), &never())
        .await
        .expect_err("Empty patch must be rejected");
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine
        .service
        .update_reminder(
            reminder.id,
            ReminderPatch {
                minutes_before: Some(-30),
                ..ReminderPatch::default()
            },
            &never(),
        )
        .await
        .expect_err("Negative lead time must be rejected");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

/// ## Summary
/// Test that reminders cannot be attached to missing or deleted events.
#[test_log::test(tokio::test)]
async fn reminder_requires_live_event() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;

    let err = engine
        .service
        .add_reminder(uuid::Uuid::now_v7(), notify(5), &never())
        .await
        .expect_err("Unknown event must be rejected");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    engine
        .service
        .delete_event(created.event.id, DeleteMode::Soft, &never())
        .await
        .expect("Failed to delete event");

    let err = engine
        .service
        .add_reminder(created.event.id, notify(5), &never())
        .await
        .expect_err("Deleted event must be rejected");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(engine.store.row_counts().reminders, 0);
}
