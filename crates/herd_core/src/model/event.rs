use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Injection,
    Note,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Injection => "Injection",
            Self::Note => "Note",
        }
    }
}

/// Completion state of an event. Only the fields of the active variant mean anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    Once {
        #[serde(default)]
        completed: bool,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "crate::model::nullable::timestamp"
        )]
        completed_at: Option<OffsetDateTime>,
        /// Interval left over from the edit form. Only read when reopening.
        #[serde(default)]
        repeat_duration: Option<u32>,
    },
    Recurring {
        repeat_duration: u32,
        /// Every occurrence dated on or before this date is complete.
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "crate::model::nullable::date"
        )]
        completed_through: Option<Date>,
    },
}

impl Schedule {
    pub fn once() -> Self {
        Self::Once {
            completed: false,
            completed_at: None,
            repeat_duration: None,
        }
    }

    pub fn every(days: u32) -> Self {
        Self::Recurring {
            repeat_duration: days,
            completed_through: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub cattle_id: String,
    /// Anchor date, the first occurrence.
    #[serde(with = "crate::model::iso_date")]
    pub date: Date,
    pub kind: EventKind,
    pub note: String,
    pub schedule: Schedule,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Event {
    pub fn is_repeated(&self) -> bool {
        matches!(self.schedule, Schedule::Recurring { .. })
    }

    pub fn is_injection(&self) -> bool {
        self.kind == EventKind::Injection
    }

    /// Days between occurrences; `None` for one-off events.
    pub fn repeat_duration(&self) -> Option<u32> {
        match self.schedule {
            Schedule::Recurring {
                repeat_duration, ..
            } => Some(repeat_duration),
            Schedule::Once { .. } => None,
        }
    }

    pub fn completed_through(&self) -> Option<Date> {
        match self.schedule {
            Schedule::Recurring {
                completed_through, ..
            } => completed_through,
            Schedule::Once { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.note.trim().is_empty() {
            return Err(AppError::invalid_event_definition(format!(
                "event {} has an empty note",
                self.id
            )));
        }
        match self.schedule {
            Schedule::Recurring {
                repeat_duration: 0, ..
            }
            | Schedule::Once {
                repeat_duration: Some(0),
                ..
            } => Err(AppError::invalid_event_definition(format!(
                "event {} has a zero repeat_duration",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    /// Merge a partial update. Completion fields that do not belong to the
    /// active schedule variant are ignored.
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(note) = patch.note.as_ref() {
            self.note = note.clone();
        }
        if let Some(schedule) = patch.schedule.as_ref() {
            self.schedule = schedule.clone();
        }

        match &mut self.schedule {
            Schedule::Once {
                completed,
                completed_at,
                ..
            } => {
                if let Some(value) = patch.completed {
                    *completed = value;
                }
                if let Some(value) = patch.completed_at {
                    *completed_at = value;
                }
            }
            Schedule::Recurring {
                completed_through, ..
            } => {
                if let Some(value) = patch.completed_through {
                    *completed_through = value;
                }
            }
        }

        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update merged into a stored event. `None` leaves a field untouched;
/// for nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub date: Option<Date>,
    pub kind: Option<EventKind>,
    pub note: Option<String>,
    pub schedule: Option<Schedule>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<OffsetDateTime>>,
    pub completed_through: Option<Option<Date>>,
    pub updated_at: Option<OffsetDateTime>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.kind.is_none()
            && self.note.is_none()
            && self.schedule.is_none()
            && self.completed.is_none()
            && self.completed_at.is_none()
            && self.completed_through.is_none()
            && self.updated_at.is_none()
    }

    pub fn touched(mut self, now: OffsetDateTime) -> Self {
        self.updated_at = Some(now);
        self
    }
}

/// Input of the "schedule event" action, shaped like the scheduling form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub date: Date,
    pub kind: EventKind,
    pub note: String,
    pub is_repeated: bool,
    pub repeat_duration: Option<u32>,
}

impl NewEvent {
    pub fn once(date: Date, kind: EventKind, note: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            note: note.into(),
            is_repeated: false,
            repeat_duration: None,
        }
    }

    pub fn every(date: Date, kind: EventKind, note: impl Into<String>, days: u32) -> Self {
        Self {
            date,
            kind,
            note: note.into(),
            is_repeated: true,
            repeat_duration: Some(days),
        }
    }

    /// Validate the form fields and build the initial schedule.
    pub fn schedule(&self) -> Result<Schedule, AppError> {
        if self.note.trim().is_empty() {
            return Err(AppError::invalid_event_definition("note is required"));
        }
        if self.repeat_duration == Some(0) {
            return Err(AppError::invalid_event_definition(
                "repeat duration must be at least 1 day",
            ));
        }

        if self.is_repeated {
            let days = self.repeat_duration.ok_or_else(|| {
                AppError::invalid_event_definition(
                    "repeat duration is required for repeated events",
                )
            })?;
            Ok(Schedule::every(days))
        } else {
            Ok(Schedule::Once {
                completed: false,
                completed_at: None,
                repeat_duration: self.repeat_duration,
            })
        }
    }

    pub fn into_event(
        self,
        id: String,
        cattle_id: String,
        now: OffsetDateTime,
    ) -> Result<Event, AppError> {
        let schedule = self.schedule()?;
        Ok(Event {
            id,
            cattle_id,
            date: self.date,
            kind: self.kind,
            note: self.note.trim().to_string(),
            schedule,
            created_at: now,
            updated_at: now,
        })
    }
}
