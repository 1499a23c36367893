//! Recurrence rule codec.
//!
//! Converts between the structured [`RecurrenceRequest`] / [`Recurrence`] forms
//! and the canonical rule string stored next to an event, e.g.
//! `FREQ=WEEKLY;COUNT=5;INTERVAL=3;BYDAY=MO,WE`.
//!
//! Token order is fixed: `FREQ`, then `UNTIL` or `COUNT`, then `INTERVAL`
//! (only when greater than 1), then `BYDAY`, then `BYMONTHDAY`. Absent tokens
//! are omitted, never emitted empty.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::{EndCondition, Frequency, Recurrence, RecurrenceRequest};

/// Basic ISO 8601 date-time format used by `UNTIL`.
pub const BASIC_FORMAT: &str = "%Y%m%dT%H%M%S";

const DATE_FORMAT: &str = "%Y%m%d";

/// Largest INTERVAL the expansion engine accepts.
pub const MAX_INTERVAL: u32 = u16::MAX as u32;

/// A rule string in canonical token order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRule(String);

impl CanonicalRule {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn decode(&self) -> Result<Recurrence, CoreError> {
        parse_rule(&self.0)
    }
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalRule {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses any well-formed rule and re-renders it in canonical order.
impl FromStr for CanonicalRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_rule(s)?.to_rule())
    }
}

/// Outcome of encoding a [`RecurrenceRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Rule(CanonicalRule),
    /// The request carried no usable frequency; the event is a one-off.
    NoRecurrence,
}

impl Encoded {
    pub fn rule(&self) -> Option<&CanonicalRule> {
        match self {
            Encoded::Rule(rule) => Some(rule),
            Encoded::NoRecurrence => None,
        }
    }

    pub fn into_rule(self) -> Option<CanonicalRule> {
        match self {
            Encoded::Rule(rule) => Some(rule),
            Encoded::NoRecurrence => None,
        }
    }
}

impl Recurrence {
    /// Renders this recurrence in canonical form.
    pub fn to_rule(&self) -> CanonicalRule {
        CanonicalRule(self.render(""))
    }

    /// Shared renderer; `until_suffix` lets the matcher mark `UNTIL` as UTC.
    pub(crate) fn render(&self, until_suffix: &str) -> String {
        let mut parts = Vec::with_capacity(5);
        parts.push(format!("FREQ={}", self.frequency));

        match self.end {
            EndCondition::Until(until) => {
                parts.push(format!("UNTIL={}{}", until.format(BASIC_FORMAT), until_suffix))
            }
            EndCondition::Count(count) => parts.push(format!("COUNT={}", count)),
            EndCondition::Never => {}
        }

        if self.interval > 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        if !self.by_days.is_empty() {
            let days: Vec<&str> = self.by_days.iter().map(|d| weekday_code(*d)).collect();
            parts.push(format!("BYDAY={}", days.join(",")));
        }

        if !self.by_month_day.is_empty() {
            let days: Vec<String> = self.by_month_day.iter().map(|d| d.to_string()).collect();
            parts.push(format!("BYMONTHDAY={}", days.join(",")));
        }

        parts.join(";")
    }
}

/// Two-letter RFC 5545 code of a weekday.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a caller-supplied recurrence into its canonical rule.
///
/// A missing or unrecognized frequency is not an error: it yields
/// [`Encoded::NoRecurrence`] and the event is treated as non-recurring.
/// Malformed day codes and out-of-range month days are rejected.
pub fn encode(request: &RecurrenceRequest) -> Result<Encoded, CoreError> {
    Ok(match normalize(request)? {
        Some(recurrence) => Encoded::Rule(recurrence.to_rule()),
        None => Encoded::NoRecurrence,
    })
}

/// Normalizes a request into a typed [`Recurrence`], `None` when the
/// frequency is missing or unrecognized.
///
/// # Behavior
/// - Intervals of 1 or less (including zero and negatives) collapse to 1
/// - Day tokens keep their first two characters, so `SUNDAY` becomes `SU`
/// - When both `until` and `count` are set, `until` wins
/// - A non-positive `count` is dropped
pub fn normalize(request: &RecurrenceRequest) -> Result<Option<Recurrence>, CoreError> {
    let frequency = match request.frequency.as_deref().map(Frequency::from_str) {
        Some(Ok(frequency)) => frequency,
        _ => {
            tracing::debug!(
                frequency = ?request.frequency,
                "Unrecognized recurrence frequency, treating event as non-recurring"
            );
            return Ok(None);
        }
    };

    let interval = match request.interval {
        Some(interval) if interval > 1 => u32::try_from(interval)
            .ok()
            .filter(|i| *i <= MAX_INTERVAL)
            .ok_or_else(|| CoreError::InvalidInput(format!("Interval {} is too large", interval)))?,
        _ => 1,
    };

    let by_days = request
        .by_days
        .iter()
        .flatten()
        .map(|token| parse_day_token(token))
        .collect::<Result<Vec<_>, _>>()?;

    let by_month_day = request
        .by_month_day
        .iter()
        .flatten()
        .map(|day| match u8::try_from(*day) {
            Ok(d) if (1..=31).contains(&d) => Ok(d),
            _ => Err(CoreError::InvalidMonthDay(*day)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let end = match (request.until, request.count) {
        (Some(until), count) => {
            if count.is_some() {
                tracing::debug!("Both until and count supplied, keeping until");
            }
            EndCondition::Until(until)
        }
        (None, Some(count)) if count > 0 => EndCondition::Count(u32::try_from(count).map_err(
            |_| CoreError::InvalidInput(format!("Count {} is too large", count)),
        )?),
        _ => EndCondition::Never,
    };

    Ok(Some(Recurrence {
        frequency,
        interval,
        by_days,
        by_month_day,
        end,
    }))
}

fn parse_day_token(token: &str) -> Result<Weekday, CoreError> {
    let prefix: String = token.chars().take(2).collect();
    if prefix.chars().count() < 2 {
        return Err(CoreError::InvalidDayCode(token.to_string()));
    }
    weekday_from_code(&prefix.to_ascii_uppercase())
        .ok_or_else(|| CoreError::InvalidDayCode(token.to_string()))
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a stored rule. `None` means the event does not recur.
pub fn decode(rule: Option<&str>) -> Result<Option<Recurrence>, CoreError> {
    rule.map(parse_rule).transpose()
}

/// Parses a rule string into a [`Recurrence`].
///
/// Tokens may appear in any order and an `RRULE:` prefix is accepted. RFC 5545
/// parts the model does not carry (`WKST`, `BYMONTH`, ...) are ignored. A
/// missing or unknown `FREQ` is an error: stored rules are expected to be
/// well-formed.
pub fn parse_rule(rule: &str) -> Result<Recurrence, CoreError> {
    let trimmed = rule.trim();
    let body = match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
        _ => trimmed,
    };

    if body.is_empty() {
        return Err(CoreError::InvalidRule("empty rule".to_string()));
    }

    let mut frequency = None;
    let mut interval = 1;
    let mut by_days = Vec::new();
    let mut by_month_day = Vec::new();
    let mut until = None;
    let mut count = None;

    for part in body.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidRule(format!("malformed part '{}' in '{}'", part, rule)))?;
        let value = value.trim();

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                frequency = Some(
                    value
                        .parse::<Frequency>()
                        .map_err(|e| CoreError::InvalidRule(e.to_string()))?,
                )
            }
            "INTERVAL" => {
                interval = parse_positive(key, value)?;
                if interval > MAX_INTERVAL {
                    return Err(CoreError::InvalidRule(format!(
                        "INTERVAL {} exceeds {}",
                        interval, MAX_INTERVAL
                    )));
                }
            }
            "COUNT" => count = Some(parse_positive(key, value)?),
            "UNTIL" => until = Some(parse_until(value)?),
            "BYDAY" => {
                by_days = value
                    .split(',')
                    .map(|code| {
                        weekday_from_code(&code.trim().to_ascii_uppercase()).ok_or_else(|| {
                            CoreError::InvalidRule(format!("unsupported BYDAY value '{}'", code))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            "BYMONTHDAY" => {
                by_month_day = value
                    .split(',')
                    .map(|day| match day.trim().parse::<u8>() {
                        Ok(d) if (1..=31).contains(&d) => Ok(d),
                        _ => Err(CoreError::InvalidRule(format!(
                            "unsupported BYMONTHDAY value '{}'",
                            day
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => tracing::debug!(part = other, "Ignoring unsupported recurrence rule part"),
        }
    }

    let frequency =
        frequency.ok_or_else(|| CoreError::InvalidRule(format!("missing FREQ in '{}'", rule)))?;

    let end = match (until, count) {
        (Some(until), _) => EndCondition::Until(until),
        (None, Some(count)) => EndCondition::Count(count),
        (None, None) => EndCondition::Never,
    };

    Ok(Recurrence {
        frequency,
        interval,
        by_days,
        by_month_day,
        end,
    })
}

fn parse_positive(key: &str, value: &str) -> Result<u32, CoreError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoreError::InvalidRule(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))),
    }
}

/// Accepts `YYYYMMDDTHHMMSS`, the same with a trailing `Z`, or a bare `YYYYMMDD`.
fn parse_until(value: &str) -> Result<NaiveDateTime, CoreError> {
    let local = value.strip_suffix(['Z', 'z']).unwrap_or(value);
    NaiveDateTime::parse_from_str(local, BASIC_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(local, DATE_FORMAT).map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| CoreError::InvalidRule(format!("invalid UNTIL '{}': {}", value, e)))
}
