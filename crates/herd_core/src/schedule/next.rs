use crate::model::Event;
use crate::schedule::occurrence::step_from;
use time::Date;

/// First occurrence of a recurring injection that is neither complete nor
/// before `today`.
///
/// Computed directly from the anchor, the interval, the watermark and `today`,
/// so series of any length resolve in constant time.
pub fn next_actionable(event: &Event, today: Date) -> Option<Date> {
    if !event.is_injection() {
        return None;
    }
    let step = event.repeat_duration()?;

    let not_past = steps_to_reach(event.date, step, today);
    let not_completed = match event.completed_through() {
        Some(watermark) if watermark >= event.date => {
            let whole_steps = (watermark - event.date).whole_days() / i64::from(step);
            u32::try_from(whole_steps + 1).ok()?
        }
        _ => 0,
    };

    step_from(event.date, step, not_past.max(not_completed))
}

/// First repeat of a recurring event on or after `today`, ignoring completion.
pub fn next_scheduled(event: &Event, today: Date) -> Option<Date> {
    let step = event.repeat_duration()?;
    step_from(event.date, step, steps_to_reach(event.date, step, today).max(1))
}

/// Earliest actionable injection across one animal's events.
pub fn next_injection(events: &[Event], today: Date) -> Option<Date> {
    events
        .iter()
        .filter_map(|event| next_actionable(event, today))
        .min()
}

/// Smallest index whose occurrence falls on or after `today`.
fn steps_to_reach(anchor: Date, step: u32, today: Date) -> u32 {
    if today <= anchor {
        return 0;
    }
    let step = i64::from(step);
    let offset = (today - anchor).whole_days();
    u32::try_from((offset + step - 1) / step).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{next_actionable, next_injection, next_scheduled};
    use crate::model::{Event, EventKind, EventPatch, NewEvent};
    use crate::schedule::completion::is_occurrence_completed;
    use pretty_assertions::assert_eq;
    use time::macros::{date, datetime};
    use time::{Date, Duration};

    fn event(draft: NewEvent) -> Event {
        draft
            .into_event(
                "evt-1".to_string(),
                "cow-1".to_string(),
                datetime!(2024-01-01 0:00 UTC),
            )
            .unwrap()
    }

    fn with_watermark(mut event: Event, watermark: Option<Date>) -> Event {
        event.apply(&EventPatch {
            completed_through: Some(watermark),
            ..EventPatch::default()
        });
        event
    }

    /// Step through the series the slow way, bounded like the calendar view.
    fn walk(event: &Event, today: Date) -> Option<Date> {
        let step = Duration::days(i64::from(event.repeat_duration()?));
        let mut date = event.date;
        for _ in 0..100 {
            if !is_occurrence_completed(event, date) && date >= today {
                return Some(date);
            }
            date += step;
        }
        None
    }

    #[test]
    fn next_due_after_completed_occurrence() {
        let event = with_watermark(
            event(NewEvent::every(
                date!(2024 - 01 - 01),
                EventKind::Injection,
                "deworming",
                7,
            )),
            Some(date!(2024 - 01 - 16)),
        );

        assert_eq!(
            next_actionable(&event, date!(2024 - 01 - 16)),
            Some(date!(2024 - 01 - 22))
        );
    }

    #[test]
    fn open_anchor_in_future_is_next() {
        let event = event(NewEvent::every(
            date!(2024 - 03 - 01),
            EventKind::Injection,
            "vaccine",
            30,
        ));

        assert_eq!(
            next_actionable(&event, date!(2024 - 01 - 16)),
            Some(date!(2024 - 03 - 01))
        );
    }

    #[test]
    fn occurrence_due_today_is_actionable() {
        let event = event(NewEvent::every(
            date!(2024 - 01 - 01),
            EventKind::Injection,
            "vaccine",
            5,
        ));

        assert_eq!(
            next_actionable(&event, date!(2024 - 01 - 11)),
            Some(date!(2024 - 01 - 11))
        );
    }

    #[test]
    fn closed_form_matches_walk() {
        let anchor = date!(2024 - 01 - 01);
        for step in [1u32, 3, 7, 10] {
            for watermark_offset in [
                None,
                Some(-3i64),
                Some(0),
                Some(1),
                Some(8),
                Some(22),
                Some(40),
            ] {
                for today_offset in [-10i64, 0, 1, 6, 7, 15, 29, 60] {
                    let watermark = watermark_offset.map(|days| anchor + Duration::days(days));
                    let event = with_watermark(
                        event(NewEvent::every(anchor, EventKind::Injection, "shot", step)),
                        watermark,
                    );
                    let today = anchor + Duration::days(today_offset);

                    assert_eq!(
                        next_actionable(&event, today),
                        walk(&event, today),
                        "step={step} watermark={watermark:?} today={today}"
                    );
                }
            }
        }
    }

    #[test]
    fn notes_and_one_off_events_have_no_next_injection() {
        let note = event(NewEvent::every(
            date!(2024 - 01 - 01),
            EventKind::Note,
            "weigh",
            7,
        ));
        let one_off = event(NewEvent::once(
            date!(2024 - 02 - 01),
            EventKind::Injection,
            "booster",
        ));

        assert_eq!(next_actionable(&note, date!(2024 - 01 - 02)), None);
        assert_eq!(next_actionable(&one_off, date!(2024 - 01 - 02)), None);
        assert_eq!(next_injection(&[note, one_off], date!(2024 - 01 - 02)), None);
    }

    #[test]
    fn next_injection_picks_earliest_series() {
        let monthly = event(NewEvent::every(
            date!(2024 - 01 - 01),
            EventKind::Injection,
            "vaccine",
            30,
        ));
        let mut weekly = event(NewEvent::every(
            date!(2024 - 01 - 03),
            EventKind::Injection,
            "deworming",
            7,
        ));
        weekly.id = "evt-2".to_string();

        assert_eq!(
            next_injection(&[monthly, weekly], date!(2024 - 01 - 05)),
            Some(date!(2024 - 01 - 10))
        );
    }

    #[test]
    fn next_scheduled_skips_anchor_and_past_repeats() {
        let event = event(NewEvent::every(
            date!(2024 - 01 - 01),
            EventKind::Note,
            "weigh",
            7,
        ));

        assert_eq!(
            next_scheduled(&event, date!(2023 - 12 - 01)),
            Some(date!(2024 - 01 - 08))
        );
        assert_eq!(
            next_scheduled(&event, date!(2024 - 01 - 16)),
            Some(date!(2024 - 01 - 22))
        );
        assert_eq!(
            next_scheduled(&event, date!(2024 - 01 - 15)),
            Some(date!(2024 - 01 - 15))
        );
    }
}
