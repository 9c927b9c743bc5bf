use crate::error::AppError;
use crate::model::{Event, EventPatch, Schedule};
use crate::schedule::occurrence::occurrence_index;
use time::{Date, Duration, OffsetDateTime};

pub fn is_occurrence_completed(event: &Event, occurrence_date: Date) -> bool {
    match event.schedule {
        Schedule::Once { completed, .. } => completed,
        Schedule::Recurring {
            completed_through, ..
        } => completed_through.is_some_and(|watermark| occurrence_date <= watermark),
    }
}

/// Patch that marks the occurrence on `occurrence_date` done.
///
/// One-off events are settled from the day after confirmation, so
/// `completed_at` is `now` plus one day. For a recurring event the watermark
/// moves to the day after the occurrence and never moves backwards, which
/// completes every earlier occurrence as well.
pub fn mark_completed(
    event: &Event,
    occurrence_date: Date,
    now: OffsetDateTime,
) -> Result<EventPatch, AppError> {
    match event.schedule {
        Schedule::Once { completed: true, .. } => Ok(EventPatch::default()),
        Schedule::Once { .. } => {
            let settled_at = now
                .checked_add(Duration::DAY)
                .ok_or_else(|| AppError::invalid_input("completion time is out of range"))?;
            Ok(EventPatch {
                completed: Some(true),
                completed_at: Some(Some(settled_at)),
                ..EventPatch::default()
            })
        }
        Schedule::Recurring {
            completed_through, ..
        } => {
            occurrence_index(event, occurrence_date)?;
            let target = occurrence_date.next_day().ok_or_else(|| {
                AppError::invalid_occurrence_date("occurrence date is out of range")
            })?;

            let watermark = completed_through.map_or(target, |current| current.max(target));
            if completed_through == Some(watermark) {
                return Ok(EventPatch::default());
            }

            Ok(EventPatch {
                completed_through: Some(Some(watermark)),
                ..EventPatch::default()
            })
        }
    }
}

/// Patch that reopens the occurrence on `occurrence_date`.
///
/// A recurring watermark rolls back one interval before the occurrence, without
/// the day added by [`mark_completed`], and is cleared rather than moved before
/// the anchor. Reopening an occurrence that is not complete changes nothing.
pub fn mark_incomplete(event: &Event, occurrence_date: Date) -> Result<EventPatch, AppError> {
    match event.schedule {
        Schedule::Once {
            completed: false, ..
        } => Ok(EventPatch::default()),
        Schedule::Once {
            completed_at,
            repeat_duration,
            ..
        } => {
            let completed_at = match (completed_at, repeat_duration) {
                (Some(at), Some(days)) => Some(
                    at.checked_add(Duration::days(i64::from(days)))
                        .ok_or_else(|| AppError::invalid_input("completion time is out of range"))?,
                ),
                _ => completed_at,
            };
            Ok(EventPatch {
                completed: Some(false),
                completed_at: Some(completed_at),
                ..EventPatch::default()
            })
        }
        Schedule::Recurring {
            repeat_duration,
            completed_through,
        } => {
            occurrence_index(event, occurrence_date)?;
            if !is_occurrence_completed(event, occurrence_date) {
                return Ok(EventPatch::default());
            }

            let rolled_back = occurrence_date
                .checked_sub(Duration::days(i64::from(repeat_duration)))
                .filter(|date| *date >= event.date);
            if rolled_back == completed_through {
                return Ok(EventPatch::default());
            }

            Ok(EventPatch {
                completed_through: Some(rolled_back),
                ..EventPatch::default()
            })
        }
    }
}
