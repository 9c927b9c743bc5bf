use crate::error::AppError;
use crate::model::{
    Cattle, CattlePatch, Event, EventKind, EventPatch, NewCattle, NewEvent, Schedule, format_date,
};
use crate::notify::{Notifier, Reminder, activation_argument};
use crate::schedule::{
    self, CalendarItem, OccurrenceKey, is_occurrence_completed, next_actionable, occurrence_date,
};
use crate::storage::{CattleStore, EventStore, Subscription};
use std::sync::{Arc, Mutex};
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatChange {
    Every(u32),
    Once,
}

/// Fields changed by the "edit event" action. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventEdit {
    pub date: Option<Date>,
    pub kind: Option<EventKind>,
    pub note: Option<String>,
    pub repeat: Option<RepeatChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextInjection {
    pub cattle: Cattle,
    pub due: Option<Date>,
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub reminders: Vec<Reminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub cattle_id: String,
    pub error: AppError,
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Today's date in the local timezone, falling back to UTC.
pub fn today() -> Date {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(local_offset).date()
}

pub fn register_cattle<S: CattleStore>(store: &S, cattle: NewCattle) -> Result<Cattle, AppError> {
    store.create_cattle(cattle)
}

pub fn edit_cattle<S: CattleStore>(
    store: &S,
    id: &str,
    patch: &CattlePatch,
) -> Result<Cattle, AppError> {
    if patch.is_empty() {
        return Err(AppError::invalid_input("nothing to update"));
    }
    store.update_cattle(id, patch)
}

pub fn schedule_event<S>(store: &S, cattle_id: &str, event: NewEvent) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    let event = store.create_event(cattle_id, event)?;
    refresh_next_injection(store, &event.cattle_id, today())?;
    Ok(event)
}

pub fn edit_event<S>(
    store: &S,
    cattle_id: &str,
    event_id: &str,
    edit: EventEdit,
    now: OffsetDateTime,
) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    let current = store.get_event(cattle_id, event_id)?;
    let note = match edit.note {
        Some(note) => {
            let trimmed = note.trim();
            if trimmed.is_empty() {
                return Err(AppError::invalid_event_definition("note is required"));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    let schedule = match edit.repeat {
        Some(change) => rescheduled(&current, change)?,
        None => None,
    };

    let patch = EventPatch {
        date: edit.date,
        kind: edit.kind,
        note,
        schedule,
        ..EventPatch::default()
    };
    if patch.is_empty() {
        return Err(AppError::invalid_input("nothing to update"));
    }

    let updated = store.update_event(cattle_id, event_id, &patch.touched(now))?;
    info!(cattle = cattle_id, event = event_id, "event edited");
    refresh_next_injection(store, &updated.cattle_id, today())?;
    Ok(updated)
}

/// Schedule that results from switching repeat mode, or `None` when unchanged.
fn rescheduled(current: &Event, change: RepeatChange) -> Result<Option<Schedule>, AppError> {
    match (&current.schedule, change) {
        (_, RepeatChange::Every(0)) => Err(AppError::invalid_event_definition(
            "repeat duration must be at least 1 day",
        )),
        (
            Schedule::Recurring {
                repeat_duration, ..
            },
            RepeatChange::Every(days),
        ) if *repeat_duration == days => Ok(None),
        (
            Schedule::Recurring {
                completed_through: Some(_),
                ..
            },
            RepeatChange::Every(_),
        ) => Err(AppError::invalid_event_definition(
            "repeat duration cannot change while occurrences are completed; reopen them first",
        )),
        (_, RepeatChange::Every(days)) => Ok(Some(Schedule::every(days))),
        (Schedule::Once { .. }, RepeatChange::Once) => Ok(None),
        (
            Schedule::Recurring {
                repeat_duration, ..
            },
            RepeatChange::Once,
        ) => Ok(Some(Schedule::Once {
            completed: false,
            completed_at: None,
            repeat_duration: Some(*repeat_duration),
        })),
    }
}

pub fn delete_event<S>(store: &S, cattle_id: &str, event_id: &str) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    let removed = store.delete_event(cattle_id, event_id)?;
    refresh_next_injection(store, &removed.cattle_id, today())?;
    Ok(removed)
}

/// Move an occurrence to `new_date`. Only the anchor can move, and never
/// into the past.
pub fn move_occurrence<S>(
    store: &S,
    cattle_id: &str,
    key: &OccurrenceKey,
    new_date: Date,
    now: OffsetDateTime,
    today: Date,
) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    if key.index != 0 {
        return Err(AppError::invalid_input("repeated occurrences cannot be moved"));
    }
    if new_date < today {
        return Err(AppError::invalid_input("cannot move events to past dates"));
    }

    let patch = EventPatch {
        date: Some(new_date),
        ..EventPatch::default()
    };
    let moved = store.update_event(cattle_id, &key.event_id, &patch.touched(now))?;
    info!(
        cattle = cattle_id,
        event = %key.event_id,
        date = %format_date(new_date),
        "event moved"
    );
    refresh_next_injection(store, &moved.cattle_id, today)?;
    Ok(moved)
}

/// Mark an occurrence done. Without a date, the first open occurrence is used.
pub fn complete_occurrence<S>(
    store: &S,
    cattle_id: &str,
    event_id: &str,
    occurrence: Option<Date>,
    now: OffsetDateTime,
    today: Date,
) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    let event = store.get_event(cattle_id, event_id)?;
    let date = match occurrence {
        Some(date) => date,
        None => first_open_occurrence(&event)?,
    };

    let patch = schedule::mark_completed(&event, date, now)?;
    if patch.is_empty() {
        return Ok(event);
    }

    let updated = store.update_event(cattle_id, event_id, &patch.touched(now))?;
    info!(
        cattle = cattle_id,
        event = event_id,
        occurrence = %format_date(date),
        "occurrence completed"
    );
    refresh_next_injection(store, &updated.cattle_id, today)?;
    Ok(updated)
}

/// Reopen an occurrence. Without a date, the latest completed occurrence is used.
pub fn reopen_occurrence<S>(
    store: &S,
    cattle_id: &str,
    event_id: &str,
    occurrence: Option<Date>,
    now: OffsetDateTime,
    today: Date,
) -> Result<Event, AppError>
where
    S: EventStore + CattleStore,
{
    let event = store.get_event(cattle_id, event_id)?;
    let date = match occurrence {
        Some(date) => date,
        None => last_completed_occurrence(&event)?,
    };

    let patch = schedule::mark_incomplete(&event, date)?;
    if patch.is_empty() {
        return Ok(event);
    }

    let updated = store.update_event(cattle_id, event_id, &patch.touched(now))?;
    info!(
        cattle = cattle_id,
        event = event_id,
        occurrence = %format_date(date),
        "occurrence reopened"
    );
    refresh_next_injection(store, &updated.cattle_id, today)?;
    Ok(updated)
}

fn first_open_occurrence(event: &Event) -> Result<Date, AppError> {
    let Some(step) = event.repeat_duration() else {
        return Ok(event.date);
    };
    let index = match event.completed_through() {
        Some(watermark) if watermark >= event.date => {
            let whole_steps = (watermark - event.date).whole_days() / i64::from(step);
            u32::try_from(whole_steps + 1).unwrap_or(u32::MAX)
        }
        _ => 0,
    };
    occurrence_date(event, index)
        .ok_or_else(|| AppError::invalid_occurrence_date("no open occurrence left in range"))
}

fn last_completed_occurrence(event: &Event) -> Result<Date, AppError> {
    let Some(step) = event.repeat_duration() else {
        return Ok(event.date);
    };
    match event.completed_through() {
        Some(watermark) if watermark >= event.date => {
            let whole_steps = (watermark - event.date).whole_days() / i64::from(step);
            let index = u32::try_from(whole_steps).unwrap_or(u32::MAX);
            occurrence_date(event, index)
                .ok_or_else(|| AppError::invalid_occurrence_date("occurrence is out of range"))
        }
        _ => Err(AppError::invalid_input("no completed occurrence to reopen")),
    }
}

pub fn calendar<S: EventStore>(
    store: &S,
    cattle_id: &str,
    today: Date,
    horizon: u32,
    range: Option<(Date, Date)>,
) -> Result<Vec<CalendarItem>, AppError> {
    let events = store.list_events(cattle_id)?;
    Ok(match range {
        Some((from, to)) => schedule::project_range(&events, today, horizon, from, to),
        None => schedule::project(&events, today, horizon),
    })
}

/// Recompute and cache the next injection date of one animal.
pub fn refresh_next_injection<S>(
    store: &S,
    cattle_id: &str,
    today: Date,
) -> Result<Option<Date>, AppError>
where
    S: EventStore + CattleStore,
{
    let events = store.list_events(cattle_id)?;
    let due = schedule::next_injection(&events, today);
    store.set_next_injection(cattle_id, due)?;
    Ok(due)
}

/// Next injection due for every animal, refreshing the cached dates.
pub fn next_injections<S>(store: &S, today: Date) -> Result<Vec<NextInjection>, AppError>
where
    S: EventStore + CattleStore,
{
    let mut summary = Vec::new();
    for cattle in store.list_cattle()? {
        let due = refresh_next_injection(store, &cattle.id, today)?;
        summary.push(NextInjection {
            cattle: Cattle {
                next_injection: due,
                ..cattle
            },
            due,
        });
    }

    summary.sort_by(|left, right| match (left.due, right.due) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => left.cattle.name.cmp(&right.cattle.name),
    });
    Ok(summary)
}

/// Injections that need doing today: recurring series due today and
/// one-off injections left open on or after their date.
pub fn due_reminders<S>(store: &S, today: Date) -> Result<Vec<Reminder>, AppError>
where
    S: EventStore + CattleStore,
{
    let mut reminders = Vec::new();
    for cattle in store.list_cattle()? {
        for event in store.list_events(&cattle.id)? {
            if !event.is_injection() {
                continue;
            }

            let due = if event.is_repeated() {
                next_actionable(&event, today).filter(|date| *date == today)
            } else if event.date <= today && !is_occurrence_completed(&event, event.date) {
                Some(event.date)
            } else {
                None
            };

            if let Some(due) = due {
                reminders.push(Reminder {
                    cattle_id: cattle.id.clone(),
                    cattle_name: cattle.name.clone(),
                    event_id: event.id.clone(),
                    note: event.note.clone(),
                    due,
                    overdue: due < today,
                });
            }
        }
    }

    Ok(reminders)
}

pub fn notify_due<S>(
    store: &S,
    notifier: &dyn Notifier,
    today: Date,
) -> Result<NotificationOutcome, AppError>
where
    S: EventStore + CattleStore,
{
    let mut notified = Vec::new();
    let mut failures = Vec::new();

    for reminder in due_reminders(store, today)? {
        let action = activation_argument(&reminder.cattle_id);
        match notifier.notify_with_action(&reminder, &action) {
            Ok(()) => notified.push(reminder),
            Err(error) => {
                warn!(cattle = %reminder.cattle_id, %error, "reminder not delivered");
                failures.push(NotificationFailure {
                    cattle_id: reminder.cattle_id,
                    error,
                });
            }
        }
    }

    Ok(NotificationOutcome {
        reminders: notified,
        failures,
    })
}

/// Cattle list kept current by a store subscription.
pub struct HerdCache {
    cattle: Arc<Mutex<Vec<Cattle>>>,
    _subscription: Subscription,
}

impl HerdCache {
    pub fn attach<S: CattleStore>(store: &S) -> Result<Self, AppError> {
        let cattle = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&cattle);
        let subscription = store.subscribe_cattle(move |latest| {
            let mut guard = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = latest.to_vec();
        })?;

        Ok(Self {
            cattle,
            _subscription: subscription,
        })
    }

    pub fn snapshot(&self) -> Vec<Cattle> {
        self.cattle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn name_of(&self, cattle_id: &str) -> Option<String> {
        self.snapshot()
            .into_iter()
            .find(|cattle| cattle.id == cattle_id)
            .map(|cattle| cattle.name)
    }
}
