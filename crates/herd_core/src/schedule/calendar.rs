use crate::model::{Event, EventKind};
use crate::schedule::occurrence::{OccurrenceKey, occurrences};
use serde::Serialize;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Swatch {
    pub border: &'static str,
    pub background: &'static str,
}

/// Colours for one calendar entry. Green when done, red for injections and
/// blue for notes, with the one-off entries a shade darker than repeats.
pub fn swatch(kind: EventKind, is_repeated_instance: bool, completed: bool) -> Swatch {
    let (border, background) = match (kind, completed, is_repeated_instance) {
        (EventKind::Injection, true, false) => ("#16a34a", "#bbf7d0"),
        (EventKind::Injection, true, true) => ("#22c55e", "#dcfce7"),
        (EventKind::Note, true, false) => ("#059669", "#a7f3d0"),
        (EventKind::Note, true, true) => ("#10b981", "#d1fae5"),
        (EventKind::Injection, false, false) => ("#dc2626", "#fecaca"),
        (EventKind::Injection, false, true) => ("#ef4444", "#fee2e2"),
        (EventKind::Note, false, false) => ("#2563eb", "#bfdbfe"),
        (EventKind::Note, false, true) => ("#3b82f6", "#dbeafe"),
    };
    Swatch { border, background }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarItem {
    pub key: OccurrenceKey,
    pub cattle_id: String,
    #[serde(with = "crate::model::iso_date")]
    pub date: Date,
    pub kind: EventKind,
    pub title: &'static str,
    pub note: String,
    pub is_repeated_instance: bool,
    pub completed: bool,
    pub is_today: bool,
    pub swatch: Swatch,
}

/// Every occurrence of `events` within `horizon`, ordered by date.
pub fn project(events: &[Event], today: Date, horizon: u32) -> Vec<CalendarItem> {
    let mut items: Vec<CalendarItem> = events
        .iter()
        .flat_map(|event| {
            occurrences(event, horizon).map(move |occurrence| CalendarItem {
                cattle_id: event.cattle_id.clone(),
                date: occurrence.date,
                kind: event.kind,
                title: event.kind.label(),
                note: event.note.clone(),
                is_repeated_instance: occurrence.is_repeated_instance,
                completed: occurrence.completed,
                is_today: occurrence.date == today,
                swatch: swatch(
                    event.kind,
                    occurrence.is_repeated_instance,
                    occurrence.completed,
                ),
                key: occurrence.key,
            })
        })
        .collect();

    items.sort_by(|left, right| {
        left.date
            .cmp(&right.date)
            .then_with(|| left.key.cmp(&right.key))
    });
    items
}

/// [`project`] restricted to `from..=to`.
pub fn project_range(
    events: &[Event],
    today: Date,
    horizon: u32,
    from: Date,
    to: Date,
) -> Vec<CalendarItem> {
    project(events, today, horizon)
        .into_iter()
        .filter(|item| item.date >= from && item.date <= to)
        .collect()
}
