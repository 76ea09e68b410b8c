//! Reminder management on [`EventService`].

use cadence_core::cancel::CancelSignal;
use cadence_db::db::{CalendarRepository, CalendarStore};
use cadence_db::model::{NewReminder, Reminder};
use uuid::Uuid;

use super::service::{EventService, finish, load_live_event, now, validate_minutes_before};
use super::types::{ReminderPatch, ReminderRequest};
use crate::error::{ServiceError, ServiceResult};

async fn load_reminder<R>(repo: &mut R, reminder_id: Uuid) -> ServiceResult<Reminder>
where
    R: CalendarRepository + ?Sized,
{
    let reminder = repo
        .get_reminder(reminder_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("reminder", reminder_id))?;
    // Reminders of a soft-deleted event are as gone as the event.
    load_live_event(repo, reminder.event_id).await?;
    Ok(reminder)
}

impl<S: CalendarStore> EventService<S> {
    /// ## Summary
    /// Attaches a reminder to an event.
    ///
    /// ## Errors
    /// Returns `ValidationError` for a negative or oversized `minutes_before`,
    /// `NotFound` for a missing or deleted event, and `DatabaseError` if the write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%event_id))]
    pub async fn add_reminder(
        &self,
        event_id: Uuid,
        request: ReminderRequest,
        cancel: &CancelSignal,
    ) -> ServiceResult<Reminder> {
        cancel
            .run(async {
                let minutes_before = validate_minutes_before(request.minutes_before)?;

                let mut tx = self.store.begin().await?;
                let result: ServiceResult<Reminder> = async {
                    load_live_event(&mut *tx, event_id).await?;
                    let now = now();
                    Ok(tx
                        .insert_reminder(&NewReminder {
                            id: Uuid::now_v7(),
                            event_id,
                            minutes_before,
                            method: request.method.into(),
                            created_at: now,
                            updated_at: now,
                        })
                        .await?)
                }
                .await;
                let reminder = finish(tx, result).await?;

                tracing::info!(reminder_id = %reminder.id, "Reminder added");
                Ok(reminder)
            })
            .await
    }

    /// ## Summary
    /// Changes the lead time or delivery method of a reminder.
    ///
    /// ## Errors
    /// Returns `ValidationError` for an empty patch or an invalid
    /// `minutes_before`, `NotFound` for a missing reminder or event, and
    /// `DatabaseError` if the write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%reminder_id))]
    pub async fn update_reminder(
        &self,
        reminder_id: Uuid,
        patch: ReminderPatch,
        cancel: &CancelSignal,
    ) -> ServiceResult<Reminder> {
        cancel
            .run(async {
                if patch == ReminderPatch::default() {
                    return Err(ServiceError::ValidationError(
                        "reminder patch sets no fields".into(),
                    ));
                }
                let minutes_before = patch
                    .minutes_before
                    .map(validate_minutes_before)
                    .transpose()?;

                let mut tx = self.store.begin().await?;
                let result: ServiceResult<Reminder> = async {
                    let mut reminder = load_reminder(&mut *tx, reminder_id).await?;
                    if let Some(minutes_before) = minutes_before {
                        reminder.minutes_before = minutes_before;
                    }
                    if let Some(method) = patch.method {
                        reminder.method = method.into();
                    }
                    reminder.updated_at = now();
                    Ok(tx.update_reminder(&reminder).await?)
                }
                .await;
                let reminder = finish(tx, result).await?;

                tracing::info!("Reminder updated");
                Ok(reminder)
            })
            .await
    }

    /// ## Summary
    /// Removes a reminder.
    ///
    /// ## Errors
    /// Returns `NotFound` for a missing reminder or event, and `DatabaseError`
    /// if the write fails.
    #[tracing::instrument(parent = &self.span, skip_all, fields(%reminder_id))]
    pub async fn delete_reminder(&self, reminder_id: Uuid, cancel: &CancelSignal) -> ServiceResult<()> {
        cancel
            .run(async {
                let mut tx = self.store.begin().await?;
                let result: ServiceResult<()> = async {
                    load_reminder(&mut *tx, reminder_id).await?;
                    tx.delete_reminder(reminder_id).await?;
                    Ok(())
                }
                .await;
                finish(tx, result).await?;

                tracing::info!("Reminder deleted");
                Ok(())
            })
            .await
    }
}
