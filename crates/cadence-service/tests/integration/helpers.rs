#![allow(dead_code, clippy::expect_used)]
//! Test helpers for service integration tests.
//!
//! Every test builds its own [`TestEngine`], so tests share no state and can
//! run in parallel.

use cadence_core::cancel::CancelSignal;
use cadence_core::config::RecurrenceConfig;
use cadence_db::db::CalendarStore;
use cadence_db::db::memory::MemoryStore;
use cadence_db::model::EventException;
use cadence_service::event::{CreateEventRequest, CreatedEvent, EventService};
use cadence_service::occurrence::OccurrenceView;
use cadence_service::recurrence::RecurrenceRequest;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

pub use cadence_service::error::ErrorKind;

/// An event service over a fresh in-memory store, with direct store access for assertions.
pub struct TestEngine {
    pub store: MemoryStore,
    pub service: EventService<MemoryStore>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(RecurrenceConfig::default())
    }

    pub fn with_config(config: RecurrenceConfig) -> Self {
        let store = MemoryStore::new();
        let service = EventService::new(store.clone(), config)
            .with_span(tracing::info_span!("test_engine"));
        Self { store, service }
    }

    pub async fn create(&self, request: CreateEventRequest) -> CreatedEvent {
        self.service
            .create_event(request, owner(), &never())
            .await
            .expect("Failed to create event")
    }

    pub async fn occurrences(
        &self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<OccurrenceView> {
        self.service
            .list_occurrences(event_id, start, end, &never())
            .await
            .expect("Failed to list occurrences")
    }

    /// Reads an exception row straight from the committed store.
    pub async fn exception_at(
        &self,
        event_id: Uuid,
        original_time: DateTime<Utc>,
    ) -> Option<EventException> {
        let mut repo = self.store.reader().await.expect("Failed to open reader");
        repo.exception_by_original_time(event_id, original_time)
            .await
            .expect("Failed to read exception")
    }
}

pub fn owner() -> Uuid {
    Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001)
}

pub fn never() -> CancelSignal {
    CancelSignal::never()
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("Invalid test instant")
}

/// A one-hour event starting at `start`, recurring by `rule`.
pub fn recurring(title: &str, start: DateTime<Utc>, rule: RecurrenceRequest) -> CreateEventRequest {
    let mut request = CreateEventRequest::new(title, start, start + TimeDelta::hours(1));
    request.recurrence = Some(rule);
    request
}

/// A one-hour event starting at `start` that does not recur.
pub fn single(title: &str, start: DateTime<Utc>) -> CreateEventRequest {
    CreateEventRequest::new(title, start, start + TimeDelta::hours(1))
}

pub fn daily(count: i64) -> RecurrenceRequest {
    let mut rule = RecurrenceRequest::new("daily");
    rule.count = Some(count);
    rule
}

/// Five daily standups at 09:00 from 2024-01-01.
pub async fn seed_standups(engine: &TestEngine) -> CreatedEvent {
    engine
        .create(recurring("Standup", utc(2024, 1, 1, 9, 0), daily(5)))
        .await
}

pub fn start_times(views: &[OccurrenceView]) -> Vec<DateTime<Utc>> {
    views.iter().map(|view| view.start_time).collect()
}
