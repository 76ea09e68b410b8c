//! PostgreSQL store over a bb8 pool of diesel-async connections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::connection::{DbConnection, DbPool};
use crate::db::enums::OccurrenceStatus;
use crate::db::query::{event, exception, occurrence, reminder, rule};
use crate::db::store::{CalendarRepository, CalendarStore, EventQuery, EventSlice, StoreTransaction};
use crate::db::transaction;
use crate::error::DbResult;
use crate::model::{
    Event, EventException, NewEvent, NewEventException, NewOccurrence, NewRecurrenceRule,
    NewReminder, Occurrence, RecurrenceRule, Reminder,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("state", &self.pool.state())
            .finish()
    }
}

#[async_trait]
impl CalendarStore for PgStore {
    async fn reader(&self) -> DbResult<Box<dyn CalendarRepository + '_>> {
        let conn = self.pool.get().await?;
        Ok(Box::new(PgSession { conn }))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    async fn begin(&self) -> DbResult<Box<dyn StoreTransaction + '_>> {
        let mut conn = self.pool.get().await?;
        transaction::begin(&mut conn).await?;
        Ok(Box::new(PgSession { conn }))
    }
}

/// A pooled connection, optionally inside an open transaction.
///
/// If a transaction is dropped before commit or rollback, the connection goes
/// back to the pool with a transaction still open; the pool treats it as
/// broken and closes it, which rolls the transaction back server-side.
struct PgSession<'a> {
    conn: DbConnection<'a>,
}

#[async_trait]
impl StoreTransaction for PgSession<'_> {
    async fn commit(self: Box<Self>) -> DbResult<()> {
        let mut session = *self;
        transaction::commit(&mut session.conn).await
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        let mut session = *self;
        transaction::rollback(&mut session.conn).await
    }
}

#[async_trait]
impl CalendarRepository for PgSession<'_> {
    async fn insert_event(&mut self, new_event: &NewEvent) -> DbResult<Event> {
        Ok(event::create_event(&mut self.conn, new_event).await?)
    }

    async fn get_event(&mut self, id: Uuid) -> DbResult<Option<Event>> {
        Ok(event::get_event(&mut self.conn, id).await?)
    }

    async fn update_event(&mut self, row: &Event) -> DbResult<Event> {
        Ok(event::update_event(&mut self.conn, row).await?)
    }

    async fn delete_event(&mut self, id: Uuid) -> DbResult<usize> {
        Ok(event::delete_event(&mut self.conn, id).await?)
    }

    async fn list_events(&mut self, query: &EventQuery) -> DbResult<EventSlice> {
        Ok(event::list_events(&mut self.conn, query).await?)
    }

    async fn insert_rule(&mut self, new_rule: &NewRecurrenceRule) -> DbResult<RecurrenceRule> {
        Ok(rule::create_rule(&mut self.conn, new_rule).await?)
    }

    async fn rule_for_event(&mut self, event_id: Uuid) -> DbResult<Option<RecurrenceRule>> {
        Ok(rule::rule_for_event(&mut self.conn, event_id).await?)
    }

    async fn update_rule(&mut self, row: &RecurrenceRule) -> DbResult<RecurrenceRule> {
        Ok(rule::update_rule(&mut self.conn, row).await?)
    }

    async fn delete_rule_for_event(&mut self, event_id: Uuid) -> DbResult<usize> {
        Ok(rule::delete_for_event(&mut self.conn, event_id).await?)
    }

    async fn insert_occurrences(&mut self, occurrences: &[NewOccurrence]) -> DbResult<usize> {
        Ok(occurrence::insert_occurrences(&mut self.conn, occurrences).await?)
    }

    async fn get_occurrence(&mut self, id: Uuid) -> DbResult<Option<Occurrence>> {
        Ok(occurrence::get_occurrence(&mut self.conn, id).await?)
    }

    async fn occurrences_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Occurrence>> {
        Ok(occurrence::occurrences_in_range(&mut self.conn, event_id, start, end).await?)
    }

    async fn update_occurrence_status(
        &mut self,
        id: Uuid,
        status: OccurrenceStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<Option<Occurrence>> {
        Ok(occurrence::update_status(&mut self.conn, id, status, updated_at).await?)
    }

    async fn insert_exception(
        &mut self,
        new_exception: &NewEventException,
    ) -> DbResult<EventException> {
        Ok(exception::create_exception(&mut self.conn, new_exception).await?)
    }

    async fn update_exception(&mut self, row: &EventException) -> DbResult<EventException> {
        Ok(exception::update_exception(&mut self.conn, row).await?)
    }

    async fn exception_by_original_time(
        &mut self,
        event_id: Uuid,
        original_time: DateTime<Utc>,
    ) -> DbResult<Option<EventException>> {
        Ok(exception::get_by_key(&mut self.conn, event_id, original_time).await?)
    }

    async fn exceptions_in_range(
        &mut self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<EventException>> {
        Ok(exception::exceptions_in_range(&mut self.conn, event_id, start, end).await?)
    }

    async fn exception_by_occurrence(
        &mut self,
        occurrence_id: Uuid,
    ) -> DbResult<Option<EventException>> {
        Ok(exception::get_by_occurrence(&mut self.conn, occurrence_id).await?)
    }

    async fn insert_reminder(&mut self, new_reminder: &NewReminder) -> DbResult<Reminder> {
        Ok(reminder::create_reminder(&mut self.conn, new_reminder).await?)
    }

    async fn get_reminder(&mut self, id: Uuid) -> DbResult<Option<Reminder>> {
        Ok(reminder::get_reminder(&mut self.conn, id).await?)
    }

    async fn update_reminder(&mut self, row: &Reminder) -> DbResult<Reminder> {
        Ok(reminder::update_reminder(&mut self.conn, row).await?)
    }

    async fn delete_reminder(&mut self, id: Uuid) -> DbResult<usize> {
        Ok(reminder::delete_reminder(&mut self.conn, id).await?)
    }

    async fn reminders_for_event(&mut self, event_id: Uuid) -> DbResult<Vec<Reminder>> {
        Ok(reminder::reminders_for_event(&mut self.conn, event_id).await?)
    }
}
