pub mod config;
pub mod error;
pub mod herd_api;
pub mod model;
pub mod notify;
pub mod schedule;
pub mod storage;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Event, EventKind, Schedule};
    use time::macros::{date, datetime};

    #[test]
    fn event_has_required_fields() {
        let event = Event {
            id: "evt-1".to_string(),
            cattle_id: "cow-1".to_string(),
            date: date!(2024 - 01 - 01),
            kind: EventKind::Injection,
            note: "deworming".to_string(),
            schedule: Schedule::every(7),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        };

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.cattle_id, "cow-1");
        assert!(event.is_repeated());
        assert!(event.is_injection());
        assert_eq!(event.repeat_duration(), Some(7));
        assert_eq!(event.completed_through(), None);
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_occurrence_date("not on the repeat grid");
        assert_eq!(err.code(), "invalid_occurrence_date");
        assert_eq!(err.to_string(), "invalid_occurrence_date - not on the repeat grid");
    }
}
