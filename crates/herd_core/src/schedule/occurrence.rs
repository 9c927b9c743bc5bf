use crate::error::AppError;
use crate::model::{Event, format_date};
use crate::schedule::completion::is_occurrence_completed;
use serde::Serialize;
use std::fmt;
use time::{Date, Duration};

/// Identity of one occurrence: the owning event plus its position in the series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccurrenceKey {
    pub event_id: String,
    pub index: u32,
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.event_id, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub key: OccurrenceKey,
    pub date: Date,
    /// False only for the anchor occurrence.
    pub is_repeated_instance: bool,
    pub completed: bool,
}

/// Occurrences of one event, anchor first. A clone is an independent cursor
/// at the same position.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    event: &'a Event,
    next: u32,
    end: u32,
}

/// Occurrences of `event` up to `horizon` steps past the anchor.
///
/// One-off events yield only the anchor. Steps that would leave the
/// representable calendar are not produced.
pub fn occurrences(event: &Event, horizon: u32) -> Occurrences<'_> {
    let end = match event.repeat_duration() {
        Some(step) => last_representable_index(event.date, step)
            .min(horizon)
            .saturating_add(1),
        None => 1,
    };

    Occurrences {
        event,
        next: 0,
        end,
    }
}

pub fn generate(event: &Event, horizon: u32) -> Vec<Occurrence> {
    occurrences(event, horizon).collect()
}

/// Date of the occurrence at `index`, or `None` when the event has no such occurrence.
pub fn occurrence_date(event: &Event, index: u32) -> Option<Date> {
    match event.repeat_duration() {
        Some(step) => step_from(event.date, step, index),
        None if index == 0 => Some(event.date),
        None => None,
    }
}

/// Position of `date` in the event's series.
///
/// One-off events have a single occurrence, so the date is not consulted.
pub fn occurrence_index(event: &Event, date: Date) -> Result<u32, AppError> {
    let Some(step) = event.repeat_duration() else {
        return Ok(0);
    };

    if date < event.date {
        return Err(AppError::invalid_occurrence_date(format!(
            "{} is before the first occurrence {} of event {}",
            format_date(date),
            format_date(event.date),
            event.id
        )));
    }

    let offset = (date - event.date).whole_days();
    let step = i64::from(step);
    if offset % step != 0 {
        return Err(AppError::invalid_occurrence_date(format!(
            "{} is not an occurrence of event {} (every {} days from {})",
            format_date(date),
            event.id,
            step,
            format_date(event.date)
        )));
    }

    u32::try_from(offset / step).map_err(|_| {
        AppError::invalid_occurrence_date(format!("{} is out of range", format_date(date)))
    })
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let index = self.next;
        let date = occurrence_date(self.event, index)?;
        self.next += 1;

        Some(Occurrence {
            key: OccurrenceKey {
                event_id: self.event.id.clone(),
                index,
            },
            date,
            is_repeated_instance: index > 0,
            completed: is_occurrence_completed(self.event, date),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Occurrences<'_> {}

pub(crate) fn step_from(anchor: Date, step: u32, index: u32) -> Option<Date> {
    let days = i64::from(step).checked_mul(i64::from(index))?;
    anchor.checked_add(Duration::days(days))
}

fn last_representable_index(anchor: Date, step: u32) -> u32 {
    let room = (Date::MAX - anchor).whole_days() / i64::from(step.max(1));
    u32::try_from(room).unwrap_or(u32::MAX)
}
