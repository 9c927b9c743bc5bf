//! Recurrence and completion engine.
//!
//! Occurrences are never stored. They are derived from an [`Event`] and a
//! horizon, annotated with completion from the event's watermark (recurring)
//! or flag (one-off), and projected for the calendar or summarised into a
//! "next injection due" date.
//!
//! Everything in here is pure: mutations return an [`EventPatch`] that the
//! caller merges through the store.
//!
//! [`Event`]: crate::model::Event
//! [`EventPatch`]: crate::model::EventPatch

pub mod calendar;
pub mod completion;
pub mod next;
pub mod occurrence;

pub use calendar::{CalendarItem, Swatch, project, project_range, swatch};
pub use completion::{is_occurrence_completed, mark_completed, mark_incomplete};
pub use next::{next_actionable, next_injection, next_scheduled};
pub use occurrence::{
    Occurrence, OccurrenceKey, Occurrences, generate, occurrence_date, occurrence_index,
    occurrences,
};

/// Further occurrences generated after the anchor of a recurring event.
pub const DEFAULT_HORIZON: u32 = 52;
