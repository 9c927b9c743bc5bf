use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    /// The event record cannot describe a schedule (missing repeat interval, blank note).
    #[error("invalid_event_definition - {0}")]
    InvalidEventDefinition(String),
    /// The date is before the anchor or not on the event's repeat grid.
    #[error("invalid_occurrence_date - {0}")]
    InvalidOccurrenceDate(String),
    #[error("store_unavailable - {0}")]
    StoreUnavailable(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn invalid_event_definition<M: Into<String>>(message: M) -> Self {
        Self::InvalidEventDefinition(message.into())
    }

    pub fn invalid_occurrence_date<M: Into<String>>(message: M) -> Self {
        Self::InvalidOccurrenceDate(message.into())
    }

    pub fn store_unavailable<M: Into<String>>(message: M) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::InvalidEventDefinition(_) => "invalid_event_definition",
            Self::InvalidOccurrenceDate(_) => "invalid_occurrence_date",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::InvalidEventDefinition(message)
            | Self::InvalidOccurrenceDate(message)
            | Self::StoreUnavailable(message) => message,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
