use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the retrieval core.
///
/// None of these are fatal: lookup and validation errors carry a
/// user-facing message, and no-context conditions exist so callers never
/// prompt a model with empty context.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("speaker '{0}' not found")]
    SpeakerNotFound(String),

    #[error("no documents stored under \"{0}\"")]
    DateNotFound(String),

    #[error("key '{0}' not present in index")]
    KeyNotFound(String),

    #[error("source '{0}' has already been added")]
    SourceAlreadyIngested(String),

    #[error("both start and end dates are required for a period query")]
    PeriodIncomplete,

    #[error("unable to interpret date '{0}'")]
    InvalidDate(String),

    #[error("period start {start} must not be later than period end {end}")]
    PeriodInverted { start: NaiveDate, end: NaiveDate },

    #[error("an unknown-date selection cannot be combined with a period")]
    UnknownDateWithPeriod,

    #[error("no documents found between {start} and {end}")]
    EmptyPeriod { start: NaiveDate, end: NaiveDate },

    #[error("no context available for {0}")]
    NoContextForDate(NaiveDate),

    #[error("no relevant context found")]
    NoContext,
}
