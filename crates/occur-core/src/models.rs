use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Recurrence Models
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// How a recurrence stops. `until` and `count` can never both be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndCondition {
    /// Recurs without end; searches bound it with the matcher horizon.
    #[default]
    Never,
    /// Last possible occurrence instant (inclusive).
    Until(NaiveDateTime),
    /// Total number of occurrences, counted from the anchor.
    Count(u32),
}

/// Typed recurrence description, the normalized form of [`RecurrenceRequest`].
///
/// `interval` is always at least 1 and empty `by_days`/`by_month_day` mean
/// "unspecified", so two descriptions that encode to the same rule compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub interval: u32,
    /// Weekdays in the order they were supplied (used with WEEKLY).
    pub by_days: Vec<Weekday>,
    /// Days of the month, 1 to 31 (used with MONTHLY).
    pub by_month_day: Vec<u8>,
    pub end: EndCondition,
}

impl Recurrence {
    /// An open-ended recurrence of the given frequency with every other field unset.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_days: Vec::new(),
            by_month_day: Vec::new(),
            end: EndCondition::Never,
        }
    }

    pub fn until(&self) -> Option<NaiveDateTime> {
        match self.end {
            EndCondition::Until(until) => Some(until),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self.end {
            EndCondition::Count(count) => Some(count),
            _ => None,
        }
    }
}

/// Recurrence as exchanged with callers. Nothing here is validated: the codec
/// normalizes it into a [`Recurrence`] or rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecurrenceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_days: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_month_day: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl From<&Recurrence> for RecurrenceRequest {
    fn from(recurrence: &Recurrence) -> Self {
        Self {
            frequency: Some(recurrence.frequency.to_string()),
            interval: Some(i64::from(recurrence.interval)),
            by_days: Some(
                recurrence
                    .by_days
                    .iter()
                    .map(|day| crate::codec::weekday_code(*day).to_string())
                    .collect(),
            ),
            by_month_day: Some(recurrence.by_month_day.iter().map(|d| i64::from(*d)).collect()),
            until: recurrence.until(),
            count: recurrence.count().map(i64::from),
        }
    }
}

/// Closed query window: an instant `t` is inside when `from <= t <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl Window {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// An inverted window holds no instant at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }
}

// ============================================================================
// Event Models
// ============================================================================

/// A candidate event as handed over by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Start of the first occurrence; the anchor for recurring events.
    pub date_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub location: String,
    pub capacity: u32,
    #[serde(default)]
    pub image_key: Option<String>,
    /// Stored canonical rule, `None` for one-off events.
    #[serde(default)]
    pub recurrence: Option<String>,
    pub organizer_id: Uuid,
    #[serde(default)]
    pub activity_types: Vec<String>,
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: String::new(),
            description: None,
            date_time: NaiveDateTime::default(),
            duration_minutes: 60,
            location: String::new(),
            capacity: 0,
            image_key: None,
            recurrence: None,
            organizer_id: Uuid::nil(),
            activity_types: Vec::new(),
        }
    }
}

/// A search result: the stored event with its rule decoded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub location: String,
    pub capacity: u32,
    pub image_key: Option<String>,
    pub recurrence: Option<RecurrenceRequest>,
    pub organizer_id: Uuid,
    pub activity_types: Vec<String>,
}

impl EventResponse {
    pub fn from_record(record: EventRecord, recurrence: Option<&Recurrence>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            date_time: record.date_time,
            duration_minutes: record.duration_minutes,
            location: record.location,
            capacity: record.capacity,
            image_key: record.image_key,
            recurrence: recurrence.map(RecurrenceRequest::from),
            organizer_id: record.organizer_id,
            activity_types: record.activity_types,
        }
    }
}

/// Search criteria. Every field is optional; unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    pub location: Option<String>,
    /// Minimum duration in minutes (inclusive).
    pub duration_from: Option<u32>,
    /// Maximum duration in minutes (inclusive).
    pub duration_to: Option<u32>,
    pub capacity_min: Option<u32>,
    pub capacity_max: Option<u32>,
    /// Matches events carrying any of these categories.
    pub activity_types: Vec<String>,
    /// Defaults to now.
    pub date_time_from: Option<NaiveDateTime>,
    /// Defaults to now plus the configured search window.
    pub date_time_to: Option<NaiveDateTime>,
}
