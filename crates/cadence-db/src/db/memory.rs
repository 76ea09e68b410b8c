//! In-process store for tests and embedding.
//!
//! Tables live behind a `RwLock` and are only ever replaced whole. A
//! transaction takes the writer mutex, works on a private copy, and swaps it
//! in on commit, so readers never wait on an open transaction and never see
//! its partial writes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use cadence_core::types::EventKindFilter;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::enums::OccurrenceStatus;
use crate::db::store::{CalendarRepository, CalendarStore, EventQuery, EventSlice, StoreTransaction};
use crate::error::{DbError, DbResult};
use crate::model::{
    Event, EventException, NewEvent, NewEventException, NewOccurrence, NewRecurrenceRule,
    NewReminder, Occurrence, RecurrenceRule, Reminder,
};

/// Number of rows held in each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub events: usize,
    pub rules: usize,
    pub occurrences: usize,
    pub exceptions: usize,
    pub reminders: usize,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    events: BTreeMap<Uuid, Event>,
    rules: BTreeMap<Uuid, RecurrenceRule>,
    occurrences: BTreeMap<Uuid, Occurrence>,
    exceptions: BTreeMap<Uuid, EventException>,
    reminders: BTreeMap<Uuid, Reminder>,
}

fn row_not_found() -> DbError {
    DbError::DatabaseError(diesel::result::Error::NotFound)
}

impl Tables {
    fn require_event(&self, event_id: Uuid) -> DbResult<()> {
        if self.events.contains_key(&event_id) {
            Ok(())
        } else {
            Err(DbError::ConstraintViolation(format!(
                "event {event_id} does not exist"
            )))
        }
    }

    fn has_rule(&self, event_id: Uuid) -> bool {
        self.rules.values().any(|rule| rule.event_id == event_id)
    }

    fn insert_event(&mut self, new_event: &NewEvent) -> DbResult<Event> {
        if self.events.contains_key(&new_event.id) {
            return Err(DbError::ConstraintViolation(format!(
                "event {} already exists",
                new_event.id
            )));
        }
        let row = new_event.clone().into_row();
        self.events.insert(row.id, row.clone());
        Ok(row)
    }

    fn update_event(&mut self, event: &Event) -> DbResult<Event> {
        let slot = self.events.get_mut(&event.id).ok_or_else(row_not_found)?;
        *slot = event.clone();
        Ok(event.clone())
    }

    fn delete_event(&mut self, id: Uuid) -> usize {
        if self.events.remove(&id).is_none() {
            return 0;
        }
        self.rules.retain(|_, rule| rule.event_id != id);
        self.occurrences.retain(|_, row| row.event_id != id);
        self.exceptions.retain(|_, row| row.event_id != id);
        self.reminders.retain(|_, row| row.event_id != id);
        1
    }

    fn list_events(&self, query: &EventQuery) -> EventSlice {
        let mut matches: Vec<&Event> = self
            .events
            .values()
            .filter(|event| event.owner_id == query.owner_id && !event.is_deleted())
            .filter(|event| event.start_time <= query.window_end)
            .filter(|event| {
                let recurring = self.has_rule(event.id);
                let kind_ok = match query.kind {
                    EventKindFilter::Any => true,
                    EventKindFilter::Single => !recurring,
                    EventKindFilter::Recurring => recurring,
                };
                kind_ok && (recurring || event.end_time >= query.window_start)
            })
            .collect();
        matches.sort_by_key(|event| (event.start_time, event.id));

        let total = i64::try_from(matches.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        let events = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        EventSlice { events, total }
    }

    fn insert_rule(&mut self, new_rule: &NewRecurrenceRule) -> DbResult<RecurrenceRule> {
        self.require_event(new_rule.event_id)?;
        if self.has_rule(new_rule.event_id) {
            return Err(DbError::ConstraintViolation(format!(
                "event {} already has a recurrence rule",
                new_rule.event_id
            )));
        }
        let row = new_rule.clone().into_row();
        self.rules.insert(row.id, row.clone());
        Ok(row)
    }

    fn update_rule(&mut self, rule: &RecurrenceRule) -> DbResult<RecurrenceRule> {
        let slot = self.rules.get_mut(&rule.id).ok_or_else(row_not_found)?;
        *slot = rule.clone();
        Ok(rule.clone())
    }

    fn insert_occurrences(&mut self, occurrences: &[NewOccurrence]) -> DbResult<usize> {
        for new_occurrence in occurrences {
            self.require_event(new_occurrence.event_id)?;
        }

        let mut written = 0;
        for new_occurrence in occurrences {
            let taken = self.occurrences.values().any(|row| {
                row.event_id == new_occurrence.event_id
                    && row.occurrence_time == new_occurrence.occurrence_time
            });
            if taken {
                continue;
            }
            let row = new_occurrence.clone().into_row();
            self.occurrences.insert(row.id, row);
            written += 1;
        }
        Ok(written)
    }

    fn update_occurrence_status(
        &mut self,
        id: Uuid,
        status: OccurrenceStatus,
        updated_at: DateTime<Utc>,
    ) -> Option<Occurrence> {
        let row = self.occurrences.get_mut(&id)?;
        row.status = status;
        row.updated_at = updated_at;
        Some(row.clone())
    }

    fn exception_key_taken(&self, id: Uuid, event_id: Uuid, original_time: DateTime<Utc>) -> bool {
        self.exceptions.values().any(|row| {
            row.id != id && row.event_id == event_id && row.original_time == original_time
        })
    }

    fn insert_exception(&mut self, new_exception: &NewEventException) -> DbResult<EventException> {
        self.require_event(new_exception.event_id)?;
        if self.exception_key_taken(
            new_exception.id,
            new_exception.event_id,
            new_exception.original_time,
        ) {
            return Err(DbError::ConstraintViolation(format!(
                "exception for event {} at {} already exists",
                new_exception.event_id, new_exception.original_time
            )));
        }
        let row = new_exception.clone().into_row();
        self.exceptions.insert(row.id, row.clone());
        Ok(row)
    }

    fn update_exception(&mut self, exception: &EventException) -> DbResult<EventException> {
        if self.exception_key_taken(exception.id, exception.event_id, exception.original_time) {
            return Err(DbError::ConstraintViolation(format!(
                "exception for event {} at {} already exists",
                exception.event_id, exception.original_time
            )));
        }
        let slot = self
            .exceptions
            .get_mut(&exception.id)
            .ok_or_else(row_not_found)?;
        *slot = exception.clone();
        Ok(exception.clone())
    }

    fn insert_reminder(&mut self, new_reminder: &NewReminder) -> DbResult<Reminder> {
        self.require_event(new_reminder.event_id)?;
        let row = new_reminder.clone().into_row();
        self.reminders.insert(row.id, row.clone());
        Ok(row)
    }

    fn update_reminder(&mut self, reminder: &Reminder) -> DbResult<Reminder> {
        let slot = self
            .reminders
            .get_mut(&reminder.id)
            .ok_or_else(row_not_found)?;
        *slot = reminder.clone();
        Ok(reminder.clone())
    }

    fn counts(&self) -> RowCounts {
        RowCounts {
            events: self.events.len(),
            rules: self.rules.len(),
            occurrences: self.occurrences.len(),
            exceptions: self.exceptions.len(),
            reminders: self.reminders.len(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    published: RwLock<Tables>,
    writer: tokio::sync::Mutex<()>,
    fail_on: Mutex<Option<&'static str>>,
}

/// Shared in-memory calendar store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the committed row counts.
    #[must_use]
    pub fn row_counts(&self) -> RowCounts {
        self.published().counts()
    }

    /// ## Summary
    /// Arms a one-shot failure: the next call to `operation` (a repository
    /// method name such as `"insert_occurrences"`, or `"commit"`) returns
    /// [`DbError::Unavailable`] without touching any table.
    pub fn fail_on(&self, operation: &'static str) {
        *self
            .inner
            .fail_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(operation);
    }

    fn check(&self, operation: &'static str) -> DbResult<()> {
        let mut armed = self
            .inner
            .fail_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *armed == Some(operation) {
            *armed = None;
            tracing::debug!(operation, "Injected store failure");
            return Err(DbError::Unavailable(operation));
        }
        Ok(())
    }

    fn published(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn published_mut(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn reader(&self) -> DbResult<Box<dyn CalendarRepository + '_>> {
        self.check("reader")?;
        Ok(Box::new(MemorySession {
            store: self,
            mode: Mode::AutoCommit,
        }))
    }

    async fn begin(&self) -> DbResult<Box<dyn StoreTransaction + '_>> {
        self.check("begin")?;
        let writer = self.inner.writer.lock().await;
        let working = self.published().clone();
        Ok(Box::new(MemorySession {
            store: self,
            mode: Mode::Transaction {
                writer,
                working,
            },
        }))
    }
}

enum Mode<'a> {
    AutoCommit,
    Transaction {
        writer: tokio::sync::MutexGuard<'a, ()>,
        working: Tables,
    },
}

struct MemorySession<'a> {
    store: &'a MemoryStore,
    mode: Mode<'a>,
}

impl MemorySession<'_> {
    fn read<T>(&self, operation: &'static str, f: impl FnOnce(&Tables) -> T) -> DbResult<T> {
        self.store.check(operation)?;
        match &self.mode {
            Mode::Transaction { working, .. } => Ok(f(working)),
            Mode::AutoCommit => Ok(f(&self.store.published())),
        }
    }

    async fn write<T, F>(&mut self, operation: &'static str, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Tables) -> DbResult<T> + Send,
    {
        self.store.check(operation)?;
        match &mut self.mode {
            Mode::Transaction { working, .. } => f(working),
            Mode::AutoCommit => {
                let _writer = self.store.inner.writer.lock().await;
                let mut published = self.store.published_mut();
                f(&mut published)
            }
        }
    }
}

#[async_trait]
impl StoreTransaction for MemorySession<'_> {
    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.store.check("commit")?;
        let session = *self;
        if let Mode::Transaction { writer, working } = session.mode {
            *session.store.published_mut() = working;
            drop(writer);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CalendarRepository for MemorySession<'_> {
    async fn insert_event(&mut self, event: &NewEvent) -> DbResult<Event> {
        self.write("insert_event", |tables| tables.insert_event(event))
            .await
    }

    async fn get_event(&mut self, id: Uuid) -> DbResult<Option<Event>> {
        self.read("get_event", |tables| tables.events.get(&id).cloned())
    }

    async fn update_event(&mut self, event: &Event) -> DbResult<Event> {
        self.write("update_event", |tables| tables.update_event(event))
            .await
    }

    async fn delete_event(&mut self, id: Uuid) -> DbResult<usize> {
        self.write("delete_event", |tables| Ok(tables.delete_event(id)))
            .await
    }

    async fn list_events(&mut self, query: &EventQuery) -> DbResult<EventSlice> {
        self.read("list_events", |tables| tables.list_events(query))
    }

    async fn insert_rule(&mut self, rule: &NewRecurrenceRule) -> DbResult<RecurrenceRule> {
        self.write("insert_rule", |tables| tables.insert_rule(rule))
            .await
    }

    async fn rule_for_event(&mut self, event_id: Uuid) -> DbResult<Option<RecurrenceRule>> {
        self.read("rule_for_event", |tables| {
            tables
                .rules
                .values()
                .find(|rule| rule.event_id == event_id)
                .cloned()
        })
    }

    async fn update_rule(&mut self, rule: &RecurrenceRule) -> DbResult<RecurrenceRule> {
        self.write("update_rule", |tables| tables.update_rule(rule))
            .await
    }

    async fn delete_rule_for_event(&mut self, event_id: Uuid) -> DbResult<usize> {
        self.write("delete_rule_for_event", |tables| {
            let before = tables.rules.len();
            tables.rules.retain(|_, rule| rule.event_id != event_id);
            Ok(before - tables.rules.len())
        })
        .await
    }

    async fn insert_occurrences(&mut self, occurrences: &[NewOccurrence]) -> DbResult<usize> {
        self.write("insert_occurrences", |tables| {
            tables.insert_occurrences(occurrences)
        })
        .await
    }

    async fn get_occurrence(&mut self, id: Uuid) -> DbResult<Option<Occurrence>> {
        self.read("get_occurrence", |tables| tables.occurrences.get(&id).cloned())
    }

    async fn occurrences_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Occurrence>> {
        self.read("occurrences_in_range", |tables| {
            let mut rows: Vec<Occurrence> = tables
                .occurrences
                .values()
                .filter(|row| row.event_id == event_id)
                .filter(|row| row.occurrence_time >= start && row.occurrence_time <= end)
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.occurrence_time);
            rows
        })
    }

    async fn update_occurrence_status(
        &mut self,
        id: Uuid,
        status: OccurrenceStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<Option<Occurrence>> {
        self.write("update_occurrence_status", |tables| {
            Ok(tables.update_occurrence_status(id, status, updated_at))
        })
        .await
    }

    async fn insert_exception(&mut self, exception: &NewEventException) -> DbResult<EventException> {
        self.write("insert_exception", |tables| {
            tables.insert_exception(exception)
        })
        .await
    }

    async fn update_exception(&mut self, exception: &EventException) -> DbResult<EventException> {
        self.write("update_exception", |tables| {
            tables.update_exception(exception)
        })
        .await
    }

    async fn exception_by_original_time(
        &mut self,
        event_id: Uuid,
        original_time: DateTime<Utc>,
    ) -> DbResult<Option<EventException>> {
        self.read("exception_by_original_time", |tables| {
            tables
                .exceptions
                .values()
                .find(|row| row.event_id == event_id && row.original_time == original_time)
                .cloned()
        })
    }

    async fn exceptions_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<EventException>> {
        self.read("exceptions_in_range", |tables| {
            let mut rows: Vec<EventException> = tables
                .exceptions
                .values()
                .filter(|row| row.event_id == event_id)
                .filter(|row| row.original_time >= start && row.original_time <= end)
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.original_time);
            rows
        })
    }

    async fn exception_by_occurrence(
        &mut self,
        occurrence_id: Uuid,
    ) -> DbResult<Option<EventException>> {
        self.read("exception_by_occurrence", |tables| {
            tables
                .exceptions
                .values()
                .find(|row| row.occurrence_id == Some(occurrence_id))
                .cloned()
        })
    }

    async fn insert_reminder(&mut self, reminder: &NewReminder) -> DbResult<Reminder> {
        self.write("insert_reminder", |tables| tables.insert_reminder(reminder))
            .await
    }

    async fn get_reminder(&mut self, id: Uuid) -> DbResult<Option<Reminder>> {
        self.read("get_reminder", |tables| tables.reminders.get(&id).cloned())
    }

    async fn update_reminder(&mut self, reminder: &Reminder) -> DbResult<Reminder> {
        self.write("update_reminder", |tables| tables.update_reminder(reminder))
            .await
    }

    async fn delete_reminder(&mut self, id: Uuid) -> DbResult<usize> {
        self.write("delete_reminder", |tables| {
            Ok(usize::from(tables.reminders.remove(&id).is_some()))
        })
        .await
    }

    async fn reminders_for_event(&mut self, event_id: Uuid) -> DbResult<Vec<Reminder>> {
        self.read("reminders_for_event", |tables| {
            let mut rows: Vec<Reminder> = tables
                .reminders
                .values()
                .filter(|row| row.event_id == event_id)
                .cloned()
                .collect();
            rows.sort_by_key(|row| (row.minutes_before, row.id));
            rows
        })
    }
}
