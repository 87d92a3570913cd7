use thiserror::Error;

/// Problems with a timetable configuration, reported before any search starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Malformed time `{0}`: expected HH:MM (24-hour) or H:MM am/pm")]
    MalformedTime(String),

    #[error("Day end {end} must be later than day start {start}")]
    EmptyDay { start: String, end: String },

    #[error("`{field}` must be at least 1")]
    NonPositive { field: String },

    #[error("`{field}` must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("Missing required section: {0}")]
    MissingSection(&'static str),

    #[error("Subject `{subject}` references faculty `{faculty}`, which is not in the faculty list")]
    UnknownFaculty { subject: String, faculty: String },

    #[error("Subject `{subject}` prefers room `{room}`, which is not in the room list")]
    UnknownRoom { subject: String, room: String },
}

impl ConfigError {
    pub fn non_positive(field: impl Into<String>) -> Self {
        ConfigError::NonPositive {
            field: field.into(),
        }
    }
}

/// Failures while writing timetable artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not write JSON: {0}")]
    Json(#[from] serde_json::Error),
}
