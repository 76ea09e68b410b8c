//! Store contract consumed by the engine.
//!
//! A [`CalendarStore`] hands out repositories over the calendar tables. A
//! reader runs each call on its own; a [`StoreTransaction`] groups calls and
//! only publishes them on [`StoreTransaction::commit`]. Dropping a transaction
//! without committing discards its writes.

use async_trait::async_trait;
use cadence_core::types::EventKindFilter;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::enums::OccurrenceStatus;
use crate::error::DbResult;
use crate::model::{
    Event, EventException, NewEvent, NewEventException, NewOccurrence, NewRecurrenceRule,
    NewReminder, Occurrence, RecurrenceRule, Reminder,
};

/// Window and paging for listing an owner's events.
///
/// Non-recurring events match when they overlap `[window_start, window_end]`.
/// Recurring events match when their anchor starts on or before `window_end`.
/// Soft-deleted events never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub owner_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub kind: EventKindFilter,
    pub offset: i64,
    pub limit: i64,
}

/// One page of events plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct EventSlice {
    pub events: Vec<Event>,
    pub total: i64,
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// ## Summary
    /// Returns a repository that runs each call outside any transaction.
    ///
    /// ## Errors
    /// Returns an error if no connection can be acquired.
    async fn reader(&self) -> DbResult<Box<dyn CalendarRepository + '_>>;

    /// ## Summary
    /// Opens a transaction.
    ///
    /// ## Errors
    /// Returns an error if no connection can be acquired or the transaction cannot start.
    async fn begin(&self) -> DbResult<Box<dyn StoreTransaction + '_>>;
}

#[async_trait]
pub trait StoreTransaction: CalendarRepository {
    /// ## Summary
    /// Publishes every write made through this transaction.
    ///
    /// ## Errors
    /// Returns an error if the commit fails; nothing is published in that case.
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// ## Summary
    /// Discards every write made through this transaction.
    ///
    /// ## Errors
    /// Returns an error if the backend fails to roll back.
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

/// Row-level access to the calendar tables.
#[async_trait]
pub trait CalendarRepository: Send {
    async fn insert_event(&mut self, event: &NewEvent) -> DbResult<Event>;

    /// Looks up an event by id, including soft-deleted ones.
    async fn get_event(&mut self, id: Uuid) -> DbResult<Option<Event>>;

    /// Saves every column of `event` except its id.
    async fn update_event(&mut self, event: &Event) -> DbResult<Event>;

    /// Removes an event and everything that belongs to it. Returns the number of events removed.
    async fn delete_event(&mut self, id: Uuid) -> DbResult<usize>;

    /// Lists matching events ordered by start time, then id.
    async fn list_events(&mut self, query: &EventQuery) -> DbResult<EventSlice>;

    async fn insert_rule(&mut self, rule: &NewRecurrenceRule) -> DbResult<RecurrenceRule>;

    async fn rule_for_event(&mut self, event_id: Uuid) -> DbResult<Option<RecurrenceRule>>;

    async fn update_rule(&mut self, rule: &RecurrenceRule) -> DbResult<RecurrenceRule>;

    async fn delete_rule_for_event(&mut self, event_id: Uuid) -> DbResult<usize>;

    /// Inserts occurrences, skipping any whose `(event_id, occurrence_time)` already exists.
    /// Returns the number of rows written.
    async fn insert_occurrences(&mut self, occurrences: &[NewOccurrence]) -> DbResult<usize>;

    async fn get_occurrence(&mut self, id: Uuid) -> DbResult<Option<Occurrence>>;

    /// Occurrences of an event with `start <= occurrence_time <= end`, ascending.
    async fn occurrences_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Occurrence>>;

    async fn update_occurrence_status(
        &mut self,
        id: Uuid,
        status: OccurrenceStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<Option<Occurrence>>;

    async fn insert_exception(&mut self, exception: &NewEventException) -> DbResult<EventException>;

    async fn update_exception(&mut self, exception: &EventException) -> DbResult<EventException>;

    async fn exception_by_original_time(
        &mut self,
        event_id: Uuid,
        original_time: DateTime<Utc>,
    ) -> DbResult<Option<EventException>>;

    /// Exceptions of an event with `start <= original_time <= end`, ascending.
    async fn exceptions_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<EventException>>;

    async fn exception_by_occurrence(
        &mut self,
        occurrence_id: Uuid,
    ) -> DbResult<Option<EventException>>;

    async fn insert_reminder(&mut self, reminder: &NewReminder) -> DbResult<Reminder>;

    async fn get_reminder(&mut self, id: Uuid) -> DbResult<Option<Reminder>>;

    async fn update_reminder(&mut self, reminder: &Reminder) -> DbResult<Reminder>;

    async fn delete_reminder(&mut self, id: Uuid) -> DbResult<usize>;

    /// Reminders of an event, ordered by `minutes_before`.
    async fn reminders_for_event(&mut self, event_id: Uuid) -> DbResult<Vec<Reminder>>;
}
