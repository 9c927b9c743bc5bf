mod cattle;
mod event;

pub use cattle::{Cattle, CattlePatch, NewCattle};
pub use event::{Event, EventKind, EventPatch, NewEvent, Schedule};

use crate::error::AppError;
use time::Date;
use time::macros::format_description;

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

/// Nullable fields of the tagged `Schedule` enum. Inside a tagged enum serde
/// replays a JSON `null` as a unit value, which the `time` option helpers reject,
/// so these read through `Option<String>` instead.
pub(crate) mod nullable {
    pub(crate) mod date {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub(crate) fn serialize<S: Serializer>(
            value: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            crate::model::iso_date::option::serialize(value, serializer)
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    Date::parse(&raw, crate::model::ISO_DATE).map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }

    pub(crate) mod timestamp {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::OffsetDateTime;
        use time::format_description::well_known::Rfc3339;

        pub(crate) fn serialize<S: Serializer>(
            value: &Option<OffsetDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            time::serde::rfc3339::option::serialize(value, serializer)
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

const ISO_DATE: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("date is required"));
    }

    Date::parse(trimmed, ISO_DATE)
        .map_err(|_| AppError::invalid_input(format!("date must be YYYY-MM-DD: {trimmed}")))
}

pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| date.to_string())
}
