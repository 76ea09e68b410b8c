//! Event orchestration over a [`CalendarStore`].
//!
//! Every mutating operation runs in a single store transaction that is only
//! committed once every write succeeded. Requests are validated before the
//! transaction opens, so a rejected request never touches storage. Every
//! operation also races the caller's [`CancelSignal`]; losing that race drops
//! the open transaction uncommitted.

use cadence_core::cancel::CancelSignal;
use cadence_core::config::RecurrenceConfig;
use cadence_core::time::normalize;
use cadence_core::types::OccurrenceStatus;
use cadence_db::db::{CalendarRepository, CalendarStore, EventQuery, StoreTransaction};
use cadence_db::model::{
    Event, EventException, NewEvent, NewOccurrence, NewReminder, Occurrence, RecurrenceRule,
};
use chrono::{DateTime, Months, TimeDelta, Utc};
use uuid::Uuid;

use super::types::{
    CreateEventRequest, CreatedEvent, DeleteMode, EventDetails, EventPage, EventPatch,
    ListEventsRequest, ListedEvent, ReminderRequest, RulePatch, UpdatedEvent,
};
use crate::error::{ServiceError, ServiceResult};
use crate::exception::{self, OccurrencePatch};
use crate::occurrence::{OccurrenceView, effective_times, materialize, resolve, single_view};
use crate::recurrence::{Generated, Generator, Rule};

/// The orchestrator. Cheap to share behind an `Arc`; holds no per-call state.
pub struct EventService<S> {
    pub(super) store: S,
    generator: Generator,
    config: RecurrenceConfig,
    pub(super) span: tracing::Span,
}

impl<S> std::fmt::Debug for EventService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService")
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Current time at storage precision.
pub(super) fn now() -> DateTime<Utc> {
    normalize(Utc::now())
}

/// ## Summary
/// Commits `tx` if `result` is a success, otherwise rolls it back.
///
/// ## Errors
/// Returns the original error, or the commit error if the commit fails.
pub(super) async fn finish<T>(
    tx: Box<dyn StoreTransaction + '_>,
    result: ServiceResult<T>,
) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.inspect_err(|err| {
                tracing::error!(error = %err, "Transaction commit failed");
            })?;
            Ok(value)
        }
        Err(err) => {
            if let ServiceError::DatabaseError(db_err) = &err {
                tracing::error!(error = %db_err, "Store operation failed, rolling back");
            }
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// ## Errors
/// Returns `NotFound` if the event does not exist or is soft-deleted.
pub(super) async fn load_live_event<R>(repo: &mut R, id: Uuid) -> ServiceResult<Event>
where
    R: CalendarRepository + ?Sized,
{
    match repo.get_event(id).await? {
        Some(event) if !event.is_deleted() => Ok(event),
        _ => Err(ServiceError::not_found("event", id)),
    }
}

/// Writes every set field of `patch` onto `event`. `title` is the already validated title.
fn apply_event_patch(event: &mut Event, patch: EventPatch, title: Option<String>) {
    if let Some(title) = title {
        event.title = title;
    }
    if patch.description.is_some() {
        event.description = patch.description;
    }
    if let Some(start_time) = patch.start_time {
        event.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        event.end_time = end_time;
    }
    if let Some(is_all_day) = patch.is_all_day {
        event.is_all_day = is_all_day;
    }
    if patch.location.is_some() {
        event.location = patch.location;
    }
    if patch.color.is_some() {
        event.color = patch.color;
    }
    if let Some(transparency) = patch.transparency {
        event.transparency = transparency.into();
    }
}

/// What an update does to the event's recurrence rule.
enum RuleChange {
    Keep,
    Remove,
    Set(Rule),
}

fn rejected(err: ServiceError) -> ServiceError {
    tracing::warn!(error = %err, "Request rejected");
    err
}

fn validate_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::ValidationError("title is required".into()));
    }
    Ok(title.to_owned())
}

fn validate_span(start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<()> {
    if end < start {
        return Err(ServiceError::ValidationError(format!(
            "end time {end} is before start time {start}"
        )));
    }
    Ok(())
}

/// ## Errors
/// Returns `ValidationError` if `minutes_before` is negative or too large to store.
pub(super) fn validate_minutes_before(minutes_before: i64) -> ServiceResult<i32> {
    i32::try_from(minutes_before)
        .ok()
        .filter(|minutes| *minutes >= 0)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "minutes before must be between 0 and {}, got {minutes_before}",
                i32::MAX
            ))
        })
}

fn stored_rule(row: &RecurrenceRule) -> ServiceResult<Rule> {
    Rule::from_row(row).map_err(|err| {
        tracing::error!(rule_id = %row.id, error = %err, "Stored recurrence rule is invalid");
        ServiceError::InvariantViolation("stored recurrence rule failed validation")
    })
}

fn upcoming(event_id: Uuid, instants: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<NewOccurrence> {
    instants
        .iter()
        .map(|&instant| NewOccurrence::upcoming(event_id, instant, now))
        .collect()
}

/// ## Summary
/// Resolves the caller-visible occurrences of `event` in `[start, end]`.
///
/// A non-recurring event yields its single instance when it overlaps the
/// window. A recurring event is regenerated from its rule, matched against
/// stored occurrence rows and merged with its exceptions.
async fn occurrences_in_window<R>(
    repo: &mut R,
    generator: &Generator,
    event: &Event,
    rule: Option<&RecurrenceRule>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ServiceResult<Vec<OccurrenceView>>
where
    R: CalendarRepository + ?Sized,
{
    let Some(rule) = rule else {
        let overlaps = event.start_time <= end && event.end_time >= start;
        return Ok(if overlaps {
            vec![single_view(event)]
        } else {
            Vec::new()
        });
    };

    let candidates = generator.generate_between(event.start_time, &stored_rule(rule)?, start, end);
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let rows = repo.occurrences_in_range(event.id, start, end).await?;
    let exceptions = repo.exceptions_in_range(event.id, start, end).await?;
    tracing::trace!(
        event_id = %event.id,
        candidates = candidates.len(),
        rows = rows.len(),
        exceptions = exceptions.len(),
        "Resolving occurrences"
    );

    Ok(resolve(event, materialize(event.id, &candidates, rows), &exceptions))
}

async fn create_rows<R>(
    repo: &mut R,
    new_event: &NewEvent,
    rule: Option<(&Rule, &Generated)>,
    reminders: &[ReminderRequest],
    now: DateTime<Utc>,
) -> ServiceResult<CreatedEvent>
where
    R: CalendarRepository + ?Sized,
{
    let event = repo.insert_event(new_event).await?;

    let (rule_row, occurrences_created, truncated) = match rule {
        Some((rule, generated)) => {
            let row = repo.insert_rule(&rule.to_new_row(event.id, now)).await?;
            let created = repo
                .insert_occurrences(&upcoming(event.id, &generated.instants, now))
                .await?;
            (Some(row), created, generated.truncated)
        }
        None => (None, 0, false),
    };

    let mut reminder_rows = Vec::with_capacity(reminders.len());
    for reminder in reminders {
        let row = repo
            .insert_reminder(&NewReminder {
                id: Uuid::now_v7(),
                event_id: event.id,
                minutes_before: validate_minutes_before(reminder.minutes_before)?,
                method: reminder.method.into(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        reminder_rows.push(row);
    }

    Ok(CreatedEvent {
        event,
        rule: rule_row,
        reminders: reminder_rows,
        occurrences_created,
        truncated,
    })
}

async fn delete_rows<R>(repo: &mut R, id: Uuid, mode: DeleteMode) -> ServiceResult<()>
where
    R: CalendarRepository + ?Sized,
{
    let Some(mut event) = repo.get_event(id).await? else {
        return Err(ServiceError::not_found("event", id));
    };

    match mode {
        DeleteMode::Soft => {
            if event.is_deleted() {
                return Err(ServiceError::not_found("event", id));
            }
            let now = now();
            event.deleted_at = Some(now);
            event.updated_at = now;
            repo.update_event(&event).await?;
        }
        DeleteMode::Hard => {
            repo.delete_event(id).await?;
        }
    }
    Ok(())
}

/// ## Summary
/// Moves every exception of a recurring event whose original instant lies in
/// `[old_start, window_end]` onto the regenerated instant `delta` later.
///
/// Rows are rewritten in the direction of travel so no two exceptions ever
/// share a key, and each is relinked to the occurrence row at its new
/// instant. Returns how many exceptions had override instants moved.
async fn shift_exceptions<R>(
    repo: &mut R,
    event_id: Uuid,
    old_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    delta: TimeDelta,
    now: DateTime<Utc>,
) -> ServiceResult<usize>
where
    R: CalendarRepository + ?Sized,
{
    let mut exceptions = repo.exceptions_in_range(event_id, old_start, window_end).await?;
    if delta > TimeDelta::zero() {
        exceptions.reverse();
    }

    let mut overrides_shifted = 0;
    for mut exception in exceptions {
        let moved_to = exception.original_time + delta;
        let occurrence_id = repo
            .occurrences_in_range(event_id, moved_to, moved_to)
            .await?
            .first()
            .map(|occurrence| occurrence.id);
        if exception::follow_anchor(&mut exception, delta, occurrence_id, now) {
            overrides_shifted += 1;
        }
        repo.update_exception(&exception).await?;
    }
    Ok(overrides_shifted)
}

impl<S: CalendarStore> EventService<S> {
    #[must_use]
    pub fn new(store: S, config: RecurrenceConfig) -> Self {
        Self {
            store,
            generator: Generator::new(config.horizon_months),
            config,
            span: tracing::info_span!("event_service"),
        }
    }

    /// Runs every operation of this service inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn generator(&self) -> &Generator {
        &self.generator
    }

    /// ## Summary
    /// Creates an event, its recurrence rule, its eagerly materialized
    /// occurrences and its reminders in one transaction.
    ///
    /// ## Errors
    /// Returns `ValidationError` for a blank title, an end before the start, an
    /// invalid rule or an invalid reminder; nothing is written in that case.
    /// Returns `DatabaseError` if any write fails, after rolling everything back.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%owner_id))]
    pub async fn create_event(
        &self,
        request: CreateEventRequest,
        owner_id: Uuid,
        cancel: &CancelSignal,
    ) -> ServiceResult<CreatedEvent> {
        cancel
            .run(async {
                tracing::debug!("Creating event");
                let request = request.normalized();

                let title = validate_title(&request.title).map_err(rejected)?;
                validate_span(request.start_time, request.end_time).map_err(rejected)?;
                let rule = request
                    .recurrence
                    .as_ref()
                    .map(Rule::from_request)
                    .transpose()
                    .map_err(|err| rejected(err.into()))?;
                for reminder in &request.reminders {
                    validate_minutes_before(reminder.minutes_before).map_err(rejected)?;
                }

                let generated = rule
                    .as_ref()
                    .map(|rule| self.generator.generate(request.start_time, rule));
                if generated.as_ref().is_some_and(|generated| generated.truncated) {
                    tracing::warn!(
                        horizon_months = self.generator.horizon_months(),
                        "Recurrence count not reached within the generation horizon"
                    );
                }

                let now = now();
                let new_event = NewEvent {
                    id: Uuid::now_v7(),
                    owner_id,
                    title,
                    description: request.description,
                    start_time: request.start_time,
                    end_time: request.end_time,
                    is_all_day: request.is_all_day,
                    location: request.location,
                    color: request.color,
                    transparency: request.transparency.into(),
                    created_at: now,
                    updated_at: now,
                };

                let mut tx = self.store.begin().await?;
                let result = create_rows(
                    &mut *tx,
                    &new_event,
                    rule.as_ref().zip(generated.as_ref()),
                    &request.reminders,
                    now,
                )
                .await;
                let created = finish(tx, result).await?;

                tracing::info!(
                    event_id = %created.event.id,
                    occurrences = created.occurrences_created,
                    truncated = created.truncated,
                    "Event created"
                );
                Ok(created)
            })
            .await
    }

    /// ## Summary
    /// Applies a partial update to an event.
    ///
    /// A changed rule or start tops up the materialized occurrences for the
    /// new sequence. When a recurring event's start moves by a delta, every
    /// exception whose original instant lies within the configured shift
    /// window after the old start moves with it: its key is re-pointed at the
    /// regenerated instant and any override start/end moves by the same delta.
    /// `exceptions_shifted` counts the exceptions whose override instants moved.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing or deleted event, `ValidationError` for
    /// an invalid patch, and `DatabaseError` if any write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(event_id = %id))]
    pub async fn update_event(
        &self,
        id: Uuid,
        patch: EventPatch,
        cancel: &CancelSignal,
    ) -> ServiceResult<UpdatedEvent> {
        cancel
            .run(async {
                tracing::debug!("Updating event");
                let patch = patch.normalized();

                let title = patch
                    .title
                    .as_deref()
                    .map(validate_title)
                    .transpose()
                    .map_err(rejected)?;
                let rule_change = match &patch.recurrence {
                    Some(RulePatch::Set(request)) => RuleChange::Set(
                        Rule::from_request(request).map_err(|err| rejected(err.into()))?,
                    ),
                    Some(RulePatch::Remove) => RuleChange::Remove,
                    None => RuleChange::Keep,
                };
                if let (Some(start), Some(end)) = (patch.start_time, patch.end_time) {
                    validate_span(start, end).map_err(rejected)?;
                }

                let mut tx = self.store.begin().await?;
                let result = self.update_rows(&mut *tx, id, patch, title, rule_change).await;
                let updated = finish(tx, result).await?;

                tracing::info!(
                    exceptions_shifted = updated.exceptions_shifted,
                    occurrences_created = updated.occurrences_created,
                    "Event updated"
                );
                Ok(updated)
            })
            .await
    }

    async fn update_rows<R>(
        &self,
        repo: &mut R,
        id: Uuid,
        patch: EventPatch,
        title: Option<String>,
        rule_change: RuleChange,
    ) -> ServiceResult<UpdatedEvent>
    where
        R: CalendarRepository + ?Sized,
    {
        let mut event = load_live_event(repo, id).await?;
        let old_start = event.start_time;

        apply_event_patch(&mut event, patch, title);
        validate_span(event.start_time, event.end_time).map_err(rejected)?;

        let now = now();
        event.updated_at = now;

        let existing_rule = repo.rule_for_event(id).await?;
        let recurring = existing_rule.is_some();
        let delta = event.start_time - old_start;
        let start_moved = !delta.is_zero();

        let (rule, rule_changed) = match rule_change {
            RuleChange::Keep => (existing_rule, false),
            RuleChange::Remove => {
                let removed = repo.delete_rule_for_event(id).await? > 0;
                (None, removed)
            }
            RuleChange::Set(rule) => {
                let row = match existing_rule {
                    Some(mut row) => {
                        rule.write_to_row(&mut row, now);
                        repo.update_rule(&row).await?
                    }
                    None => repo.insert_rule(&rule.to_new_row(id, now)).await?,
                };
                (Some(row), true)
            }
        };

        let occurrences_created = match &rule {
            Some(row) if rule_changed || start_moved => {
                let generated = self.generator.generate(event.start_time, &stored_rule(row)?);
                repo.insert_occurrences(&upcoming(id, &generated.instants, now))
                    .await?
            }
            _ => 0,
        };

        let exceptions_shifted = if recurring && start_moved {
            let window_months = self.config.exception_shift_window_years.saturating_mul(12);
            let window_end = old_start
                .checked_add_months(Months::new(window_months))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            let shifted = shift_exceptions(repo, id, old_start, window_end, delta, now).await?;
            tracing::debug!(
                delta_seconds = delta.num_seconds(),
                exceptions_shifted = shifted,
                "Moved exceptions with the anchor"
            );
            shifted
        } else {
            0
        };

        let event = repo.update_event(&event).await?;

        Ok(UpdatedEvent {
            event,
            rule,
            exceptions_shifted,
            occurrences_created,
        })
    }

    /// ## Summary
    /// Deletes an event. Soft deletion hides it from reads; hard deletion
    /// removes it with everything that belongs to it.
    ///
    /// ## Errors
    /// Returns `NotFound` if the event does not exist (or, for a soft delete,
    /// is already deleted), and `DatabaseError` if the write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(event_id = %id, ?mode))]
    pub async fn delete_event(
        &self,
        id: Uuid,
        mode: DeleteMode,
        cancel: &CancelSignal,
    ) -> ServiceResult<()> {
        cancel
            .run(async {
                let mut tx = self.store.begin().await?;
                let result = delete_rows(&mut *tx, id, mode).await;
                finish(tx, result).await?;

                tracing::info!("Event deleted");
                Ok(())
            })
            .await
    }

    /// ## Summary
    /// Loads an event with its rule and reminders.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing or soft-deleted event.
    #[tracing::instrument(parent = &self.span, skip_all, fields(event_id = %id))]
    pub async fn get_event(&self, id: Uuid, cancel: &CancelSignal) -> ServiceResult<EventDetails> {
        cancel
            .run(async {
                let mut repo = self.store.reader().await?;
                let event = load_live_event(&mut *repo, id).await?;
                let rule = repo.rule_for_event(id).await?;
                let reminders = repo.reminders_for_event(id).await?;

                Ok(EventDetails {
                    event,
                    rule,
                    reminders,
                })
            })
            .await
    }

    /// ## Summary
    /// Lists one page of an owner's events visible in a window, each with its
    /// resolved occurrences in that window.
    ///
    /// Pages are numbered from one and the page size is capped by configuration.
    ///
    /// ## Errors
    /// Returns `ValidationError` for an inverted window, page zero or page size
    /// zero, and `DatabaseError` if a read fails.
    #[tracing::instrument(
        parent = &self.span,
        skip_all,
        fields(
            owner_id = %request.owner_id,
            window_start = %request.window_start,
            window_end = %request.window_end,
            kind = ?request.kind,
        )
    )]
    pub async fn list_events(
        &self,
        request: ListEventsRequest,
        cancel: &CancelSignal,
    ) -> ServiceResult<EventPage> {
        cancel
            .run(async {
                let window_start = normalize(request.window_start);
                let window_end = normalize(request.window_end);
                validate_span(window_start, window_end).map_err(rejected)?;
                if request.page == 0 || request.page_size == 0 {
                    return Err(rejected(ServiceError::ValidationError(
                        "page and page size must be at least 1".into(),
                    )));
                }
                let page_size = request.page_size.min(self.config.max_page_size.max(1));

                let mut repo = self.store.reader().await?;
                let slice = repo
                    .list_events(&EventQuery {
                        owner_id: request.owner_id,
                        window_start,
                        window_end,
                        kind: request.kind,
                        offset: i64::from(request.page - 1) * i64::from(page_size),
                        limit: i64::from(page_size),
                    })
                    .await?;

                let mut items = Vec::with_capacity(slice.events.len());
                for event in slice.events {
                    let rule = repo.rule_for_event(event.id).await?;
                    let occurrences = occurrences_in_window(
                        &mut *repo,
                        &self.generator,
                        &event,
                        rule.as_ref(),
                        window_start,
                        window_end,
                    )
                    .await?;
                    items.push(ListedEvent { event, occurrences });
                }

                tracing::debug!(total = slice.total, page_len = items.len(), "Listed events");
                Ok(EventPage {
                    items,
                    total: slice.total,
                    page: request.page,
                    page_size,
                })
            })
            .await
    }

    /// ## Summary
    /// Lists the resolved occurrences of one event whose generated instant
    /// lies in `[window_start, window_end]`.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing or deleted event, `ValidationError` for
    /// an inverted window, and `DatabaseError` if a read fails.
    #[tracing::instrument(
        parent = &self.span,
        skip_all,
        fields(%event_id, %window_start, %window_end)
    )]
    pub async fn list_occurrences(
        &self,
        event_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        cancel: &CancelSignal,
    ) -> ServiceResult<Vec<OccurrenceView>> {
        cancel
            .run(async {
                let window_start = normalize(window_start);
                let window_end = normalize(window_end);
                validate_span(window_start, window_end).map_err(rejected)?;

                let mut repo = self.store.reader().await?;
                let event = load_live_event(&mut *repo, event_id).await?;
                let rule = repo.rule_for_event(event_id).await?;

                occurrences_in_window(
                    &mut *repo,
                    &self.generator,
                    &event,
                    rule.as_ref(),
                    window_start,
                    window_end,
                )
                .await
            })
            .await
    }

    /// ## Summary
    /// Overrides fields of a single occurrence of a recurring event.
    ///
    /// The exception keyed by the occurrence's generated instant is created if
    /// needed; fields absent from the patch keep their current values.
    ///
    /// ## Errors
    /// Returns `ValidationError` for an empty patch, a blank title or an
    /// effective end before the effective start, `NotFound` for a missing
    /// occurrence or event or an occurrence the rule no longer generates, `DomainRule` if the event is not recurring, and
    /// `DatabaseError` if a write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%occurrence_id))]
    pub async fn update_occurrence(
        &self,
        occurrence_id: Uuid,
        patch: OccurrencePatch,
        cancel: &CancelSignal,
    ) -> ServiceResult<EventException> {
        cancel
            .run(async {
                let patch = patch.normalized();
                if patch.is_empty() {
                    return Err(rejected(ServiceError::ValidationError(
                        "occurrence patch sets no fields".into(),
                    )));
                }
                if let Some(title) = &patch.title {
                    validate_title(title).map_err(rejected)?;
                }
                if let (Some(start), Some(end)) = (patch.start_time, patch.end_time) {
                    validate_span(start, end).map_err(rejected)?;
                }

                let mut tx = self.store.begin().await?;
                let result =
                    override_occurrence(&mut *tx, &self.generator, occurrence_id, &patch).await;
                let exception = finish(tx, result).await?;

                tracing::info!(exception_id = %exception.id, "Occurrence overridden");
                Ok(exception)
            })
            .await
    }

    /// ## Summary
    /// Soft-deletes the occurrence of a recurring event at its generated instant.
    ///
    /// Idempotent: deleting an already deleted occurrence succeeds without
    /// writing. The occurrence row, if any, is left in place.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing event or an instant the rule does not
    /// generate, `DomainRule` if the event is not recurring, and
    /// `DatabaseError` if a write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%event_id, %original_time))]
    pub async fn delete_occurrence(
        &self,
        event_id: Uuid,
        original_time: DateTime<Utc>,
        cancel: &CancelSignal,
    ) -> ServiceResult<EventException> {
        cancel
            .run(async {
                let original_time = normalize(original_time);

                let mut tx = self.store.begin().await?;
                let result = self
                    .delete_occurrence_rows(&mut *tx, event_id, original_time)
                    .await;
                let exception = finish(tx, result).await?;

                tracing::info!(exception_id = %exception.id, "Occurrence deleted");
                Ok(exception)
            })
            .await
    }

    async fn delete_occurrence_rows<R>(
        &self,
        repo: &mut R,
        event_id: Uuid,
        original_time: DateTime<Utc>,
    ) -> ServiceResult<EventException>
    where
        R: CalendarRepository + ?Sized,
    {
        let event = load_live_event(repo, event_id).await?;
        let Some(rule) = repo.rule_for_event(event_id).await? else {
            return Err(rejected(ServiceError::DomainRule(
                "occurrences can only be deleted from recurring events".into(),
            )));
        };

        let generated = self.generator.generate_between(
            event.start_time,
            &stored_rule(&rule)?,
            original_time,
            original_time,
        );
        if generated.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "event {event_id} has no occurrence at {original_time}"
            )));
        }

        let occurrence_id = repo
            .occurrences_in_range(event_id, original_time, original_time)
            .await?
            .first()
            .map(|occurrence| occurrence.id);

        Ok(exception::mark_deleted(repo, event_id, original_time, occurrence_id, now()).await?)
    }

    /// ## Summary
    /// Moves an occurrence from `upcoming` to `completed` or `cancelled`.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing occurrence or event, `DomainRule` for
    /// a transition out of a terminal status, and `DatabaseError` if the write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%occurrence_id, %status))]
    pub async fn update_occurrence_status(
        &self,
        occurrence_id: Uuid,
        status: OccurrenceStatus,
        cancel: &CancelSignal,
    ) -> ServiceResult<Occurrence> {
        cancel
            .run(async {
                let mut tx = self.store.begin().await?;
                let result = transition_status(&mut *tx, occurrence_id, status).await;
                let occurrence = finish(tx, result).await?;

                tracing::info!("Occurrence status updated");
                Ok(occurrence)
            })
            .await
    }
}

async fn load_occurrence<R>(repo: &mut R, occurrence_id: Uuid) -> ServiceResult<Occurrence>
where
    R: CalendarRepository + ?Sized,
{
    repo.get_occurrence(occurrence_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("occurrence", occurrence_id))
}

async fn override_occurrence<R>(
    repo: &mut R,
    generator: &Generator,
    occurrence_id: Uuid,
    patch: &OccurrencePatch,
) -> ServiceResult<EventException>
where
    R: CalendarRepository + ?Sized,
{
    let occurrence = load_occurrence(repo, occurrence_id).await?;
    let event = load_live_event(repo, occurrence.event_id).await?;
    let Some(rule) = repo.rule_for_event(event.id).await? else {
        return Err(rejected(ServiceError::DomainRule(
            "per-instance overrides require a recurring event".into(),
        )));
    };

    let at = occurrence.occurrence_time;
    if generator
        .generate_between(event.start_time, &stored_rule(&rule)?, at, at)
        .is_empty()
    {
        return Err(ServiceError::NotFound(format!(
            "occurrence {occurrence_id} is no longer scheduled by event {}",
            event.id
        )));
    }

    let now = now();
    let linked = repo
        .exception_by_occurrence(occurrence.id)
        .await?
        .filter(|linked| linked.event_id == event.id && linked.original_time == at);
    let mut exception = match linked {
        Some(linked) => linked,
        None => exception::find_or_create(repo, event.id, at, Some(occurrence.id), now).await?,
    };
    exception::apply_patch(&mut exception, patch, now);

    let (start, end) = effective_times(&event, at, &exception);
    validate_span(start, end).map_err(rejected)?;

    Ok(repo.update_exception(&exception).await?)
}

async fn transition_status<R>(
    repo: &mut R,
    occurrence_id: Uuid,
    status: OccurrenceStatus,
) -> ServiceResult<Occurrence>
where
    R: CalendarRepository + ?Sized,
{
    let occurrence = load_occurrence(repo, occurrence_id).await?;
    load_live_event(repo, occurrence.event_id).await?;

    let current = OccurrenceStatus::from(occurrence.status);
    if !current.can_transition_to(status) {
        return Err(rejected(ServiceError::DomainRule(format!(
            "occurrence cannot move from {current} to {status}"
        ))));
    }

    repo.update_occurrence_status(occurrence_id, status.into(), now())
        .await?
        .ok_or_else(|| ServiceError::not_found("occurrence", occurrence_id))
}
