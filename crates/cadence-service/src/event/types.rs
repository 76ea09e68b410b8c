//! Request, patch and result types of [`super::EventService`].

use cadence_core::time::normalize;
use cadence_core::types::{EventKindFilter, ReminderMethod, Transparency};
use cadence_db::model::{Event, RecurrenceRule, Reminder};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::occurrence::OccurrenceView;
use crate::recurrence::RecurrenceRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRequest {
    pub minutes_before: i64,
    pub method: ReminderMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderPatch {
    pub minutes_before: Option<i64>,
    pub method: Option<ReminderMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_all_day: bool,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Transparency,
    pub recurrence: Option<RecurrenceRequest>,
    pub reminders: Vec<ReminderRequest>,
}

impl CreateEventRequest {
    /// A single event with no optional fields set.
    #[must_use]
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_time,
            end_time,
            is_all_day: false,
            location: None,
            color: None,
            transparency: Transparency::default(),
            recurrence: None,
            reminders: Vec::new(),
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.start_time = normalize(self.start_time);
        self.end_time = normalize(self.end_time);
        if let Some(rule) = &mut self.recurrence {
            rule.until = rule.until.map(normalize);
        }
        self
    }
}

/// Replacement or removal of an event's recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePatch {
    Set(RecurrenceRequest),
    Remove,
}

/// Partial update of an event. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_all_day: Option<bool>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub transparency: Option<Transparency>,
    pub recurrence: Option<RulePatch>,
}

impl EventPatch {
    pub(crate) fn normalized(mut self) -> Self {
        self.start_time = self.start_time.map(normalize);
        self.end_time = self.end_time.map(normalize);
        if let Some(RulePatch::Set(rule)) = &mut self.recurrence {
            rule.until = rule.until.map(normalize);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Hide the event from reads, keeping every row.
    #[default]
    Soft,
    /// Remove the event together with its rule, occurrences, exceptions and reminders.
    Hard,
}

#[derive(Debug, Clone)]
pub struct CreatedEvent {
    pub event: Event,
    pub rule: Option<RecurrenceRule>,
    pub reminders: Vec<Reminder>,
    pub occurrences_created: usize,
    /// The rule's `count` was not reached within the generation horizon.
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatedEvent {
    pub event: Event,
    pub rule: Option<RecurrenceRule>,
    pub exceptions_shifted: usize,
    pub occurrences_created: usize,
}

#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: Event,
    pub rule: Option<RecurrenceRule>,
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEventsRequest {
    pub owner_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub kind: EventKindFilter,
    /// One-based page number.
    pub page: u32,
    pub page_size: u32,
}

/// An event visible in a window, with its resolved occurrences in that window.
#[derive(Debug, Clone)]
pub struct ListedEvent {
    pub event: Event,
    pub occurrences: Vec<OccurrenceView>,
}

#[derive(Debug, Clone)]
pub struct EventPage {
    pub items: Vec<ListedEvent>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
