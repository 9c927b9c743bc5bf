use herd_core::config::Palette;
use herd_core::error::AppError;
use herd_core::herd_api::NextInjection;
use herd_core::model::{Cattle, Event, EventKind, Schedule, format_date};
use herd_core::schedule::CalendarItem;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CattleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Breed")]
    breed: String,
    #[tabled(rename = "Next injection")]
    next_injection: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Repeat")]
    repeat: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct DueRow {
    #[tabled(rename = "Cattle")]
    cattle: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Due")]
    due: String,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

fn optional_date(date: Option<time::Date>) -> String {
    date.map(format_date).unwrap_or_else(|| "-".to_string())
}

pub fn cattle_table(cattle: &[Cattle]) -> String {
    table(
        cattle
            .iter()
            .map(|cattle| CattleRow {
                id: cattle.id.clone(),
                name: cattle.name.clone(),
                breed: cattle.breed.clone(),
                next_injection: optional_date(cattle.next_injection),
            })
            .collect(),
    )
}

pub fn cattle_details(cattle: &Cattle) -> String {
    let image = cattle.image.as_deref().unwrap_or("-");
    format!(
        "{} ({})\nbreed: {}\nimage: {}\nnext injection: {}",
        cattle.name,
        cattle.id,
        cattle.breed,
        image,
        optional_date(cattle.next_injection)
    )
}

pub fn repeat_label(event: &Event) -> String {
    match event.repeat_duration() {
        Some(days) if event.is_repeated() => format!("every {days} days"),
        _ => "once".to_string(),
    }
}

pub fn status_label(event: &Event) -> String {
    match &event.schedule {
        Schedule::Once {
            completed: true, ..
        } => "done".to_string(),
        Schedule::Once { .. } => "open".to_string(),
        Schedule::Recurring {
            completed_through: Some(watermark),
            ..
        } => format!("done before {}", format_date(*watermark)),
        Schedule::Recurring { .. } => "open".to_string(),
    }
}

pub fn events_table(events: &[Event]) -> String {
    table(
        events
            .iter()
            .map(|event| EventRow {
                id: event.id.clone(),
                date: format_date(event.date),
                kind: event.kind.label(),
                repeat: repeat_label(event),
                status: status_label(event),
                note: event.note.clone(),
            })
            .collect(),
    )
}

pub fn due_table(summary: &[NextInjection]) -> String {
    table(
        summary
            .iter()
            .map(|entry| DueRow {
                cattle: entry.cattle.id.clone(),
                name: entry.cattle.name.clone(),
                due: optional_date(entry.due),
            })
            .collect(),
    )
}

/// One line per occurrence: date, kind, note and markers.
pub fn calendar_lines(items: &[CalendarItem], palette: &Palette) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let mut line = format!(
                "{}  {:<9}  {}",
                format_date(item.date),
                item.kind.label(),
                item.note
            );
            if item.is_repeated_instance {
                line.push_str("  (repeat)");
            }
            if item.completed {
                line.push_str("  [done]");
            }
            if item.is_today {
                line.push_str("  <- today");
            }

            if item.completed {
                palette.done(&line)
            } else if item.kind == EventKind::Injection && item.is_today {
                palette.due(&line)
            } else {
                line
            }
        })
        .collect()
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}

pub fn due_json(summary: &[NextInjection]) -> serde_json::Value {
    serde_json::Value::Array(
        summary
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "cattle_id": entry.cattle.id,
                    "name": entry.cattle.name,
                    "next_injection": entry.due.map(format_date),
                })
            })
            .collect(),
    )
}
