pub mod event;
pub mod exception;
pub mod occurrence;
pub mod reminder;
pub mod rule;

pub use event::{Event, NewEvent};
pub use exception::{EventException, NewEventException};
pub use occurrence::{NewOccurrence, Occurrence};
pub use reminder::{NewReminder, Reminder};
pub use rule::{NewRecurrenceRule, RecurrenceRule};
