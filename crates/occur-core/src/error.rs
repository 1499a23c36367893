use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid day code '{0}': expected a weekday such as MO, TU or SUNDAY")]
    InvalidDayCode(String),

    #[error("Invalid day of month {0}: expected a value between 1 and 31")]
    InvalidMonthDay(i64),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Event source error: {0}")]
    Source(String),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}
