//! Event orchestration: transactional create/update/delete, windowed reads,
//! per-occurrence overrides and reminders.

mod reminder;
mod service;
mod types;

pub use service::EventService;
pub use types::{
    CreateEventRequest, CreatedEvent, DeleteMode, EventDetails, EventPage, EventPatch,
    ListEventsRequest, ListedEvent, ReminderPatch, ReminderRequest, RulePatch, UpdatedEvent,
};
