#![allow(clippy::expect_used)]
//! Tests for caller cancellation and deadlines.

use cadence_core::cancel::{CancelSignal, cancel_pair};
use cadence_db::db::memory::RowCounts;
use cadence_db::db::CalendarStore;

use super::helpers::*;

/// ## Summary
/// Test that a signal cancelled before the call runs nothing.
#[test_log::test(tokio::test)]
async fn cancelled_signal_writes_nothing() {
    let engine = TestEngine::new();
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let err = engine
        .service
        .create_event(
            recurring("Cancelled", utc(2024, 1, 1, 9, 0), daily(5)),
            owner(),
            &signal,
        )
        .await
        .expect_err("Cancelled signal must abort");

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(engine.store.row_counts(), RowCounts::default());
}

/// ## Summary
/// Test that an elapsed deadline is reported distinctly from cancellation.
#[test_log::test(tokio::test)]
async fn elapsed_deadline_is_reported() {
    let engine = TestEngine::new();
    let created = seed_standups(&engine).await;
    let signal = CancelSignal::never().with_deadline(tokio::time::Instant::now());

    let err = engine
        .service
        .list_occurrences(
            created.event.id,
            utc(2024, 1, 1, 0, 0),
            utc(2024, 1, 31, 0, 0),
            &signal,
        )
        .await
        .expect_err("Elapsed deadline must abort");

    assert!(matches!(
        err,
        cadence_service::error::ServiceError::DeadlineExceeded
    ));
}

/// ## Summary
/// Test that cancelling an operation blocked on the store aborts it promptly
/// and leaves no partial writes.
#[test_log::test(tokio::test)]
async fn cancel_interrupts_blocked_operation() {
    let engine = TestEngine::new();
    // Holding a transaction makes the service wait for the writer.
    let blocker = engine.store.begin().await.expect("Failed to begin");

    let (handle, signal) = cancel_pair();
    let create = engine.service.create_event(
        recurring("Blocked", utc(2024, 1, 1, 9, 0), daily(5)),
        owner(),
        &signal,
    );
    let trigger = async {
        tokio::task::yield_now().await;
        handle.cancel();
    };

    let (result, ()) = tokio::join!(create, trigger);
    let err = result.expect_err("Cancel must abort the blocked create");
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    blocker.rollback().await.expect("Failed to roll back");
    assert_eq!(engine.store.row_counts(), RowCounts::default());

    // The writer is free again once the cancelled call is gone.
    seed_standups(&engine).await;
    assert_eq!(engine.store.row_counts().events, 1);
}
