use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::codec::{self, BASIC_FORMAT};
use crate::error::CoreError;
use crate::models::{EndCondition, Frequency, Recurrence, Window};

/// Limits on occurrence enumeration for rules without their own end.
///
/// Both limits are measured from the later of the anchor and the window
/// start, so a rule that has been running for years still matches a
/// current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum number of occurrences inspected inside the window before giving up
    pub max_occurrences: u32,
    /// Occurrences more than this many days past the window start are never inspected
    pub lookahead_days: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 10_000,
            lookahead_days: 3_650,
        }
    }
}

/// Matcher: decides whether an event has an occurrence inside a window.
///
/// Responsibilities:
/// 1. Treat events without a rule as a single occurrence at the anchor
/// 2. Expand rules from the anchor in chronological order
/// 3. Stop at the first occurrence inside the window, past the window end,
///    at the rule's own COUNT/UNTIL, or at the configured horizon
///
/// The matcher holds nothing but its configuration and can be shared freely
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Returns whether the event anchored at `anchor` occurs inside `window`.
    ///
    /// # Arguments
    /// * `anchor` - Start of the event's first occurrence
    /// * `rule` - Decoded recurrence, `None` for one-off events
    /// * `window` - Closed range `[from, to]`
    ///
    /// # Returns
    /// * `Result<bool, CoreError>` - Err only when the rule cannot be expanded
    pub fn has_occurrence_in_window(
        &self,
        anchor: NaiveDateTime,
        rule: Option<&Recurrence>,
        window: &Window,
    ) -> Result<bool, CoreError> {
        Ok(self.first_occurrence_in_window(anchor, rule, window)?.is_some())
    }

    /// Same as [`Matcher::has_occurrence_in_window`] for a stored rule string.
    pub fn has_occurrence_for_rule(
        &self,
        anchor: NaiveDateTime,
        rule: Option<&str>,
        window: &Window,
    ) -> Result<bool, CoreError> {
        let recurrence = codec::decode(rule)?;
        self.has_occurrence_in_window(anchor, recurrence.as_ref(), window)
    }

    /// Finds the earliest occurrence inside `window`.
    ///
    /// # Behavior
    /// - No rule: the anchor itself, if the window contains it
    /// - Inverted window: `None` without expanding anything
    /// - Otherwise walk occurrences in order and return the first one in
    ///   the window; `None` once an occurrence passes `window.to`, the rule
    ///   runs out, or the horizon is reached
    ///
    /// Occurrences keep the anchor's sub-second part.
    pub fn first_occurrence_in_window(
        &self,
        anchor: NaiveDateTime,
        rule: Option<&Recurrence>,
        window: &Window,
    ) -> Result<Option<NaiveDateTime>, CoreError> {
        if window.is_empty() {
            return Ok(None);
        }

        let Some(rule) = rule else {
            return Ok(window.contains(anchor).then_some(anchor));
        };

        // DTSTART has whole-second precision.
        let start = anchor.with_nanosecond(0).unwrap_or(anchor);
        let fraction = anchor - start;

        // rrule refuses to expand an UNTIL earlier than DTSTART.
        if rule.until().is_some_and(|until| until < start) {
            return Ok(None);
        }

        let expansion = Expansion::of(rule);
        let rule_set = build_rule_set(start, &expansion.rule)?;
        let horizon = window
            .from
            .max(anchor)
            .checked_add_signed(Duration::days(i64::from(self.config.lookahead_days)))
            .unwrap_or(NaiveDateTime::MAX);
        let max_occurrences = self.config.max_occurrences as usize;
        let mut remaining = expansion.count;
        let mut inspected = 0usize;

        for occurrence in rule_set.into_iter() {
            let Some(occurrence) = occurrence.naive_utc().checked_add_signed(fraction) else {
                return Ok(None);
            };

            if occurrence > window.to {
                return Ok(None);
            }
            if inspected >= max_occurrences || occurrence > horizon {
                tracing::debug!(
                    %anchor,
                    inspected,
                    "Recurrence horizon reached without an occurrence in window"
                );
                return Ok(None);
            }
            if occurrence >= window.from {
                inspected += 1;
            }
            if !expansion.keeps(occurrence) {
                continue;
            }
            if let Some(left) = remaining {
                if left == 0 {
                    return Ok(None);
                }
                remaining = Some(left - 1);
            }
            if occurrence >= window.from {
                tracing::trace!(%anchor, %occurrence, "Found occurrence in window");
                return Ok(Some(occurrence));
            }
        }

        Ok(None)
    }
}

/// The rule handed to rrule plus whatever the matcher applies on top of it.
///
/// rrule rejects BYMONTHDAY on a WEEKLY rule. For that combination the
/// weekly expansion is filtered by day of month here, and COUNT applies to
/// the occurrences that survive the filter.
struct Expansion {
    rule: Recurrence,
    month_days: Vec<u8>,
    count: Option<u32>,
}

impl Expansion {
    fn of(rule: &Recurrence) -> Self {
        if rule.frequency != Frequency::Weekly || rule.by_month_day.is_empty() {
            return Self {
                rule: rule.clone(),
                month_days: Vec::new(),
                count: None,
            };
        }

        let end = match rule.end {
            EndCondition::Count(_) => EndCondition::Never,
            other => other,
        };
        Self {
            rule: Recurrence {
                by_month_day: Vec::new(),
                end,
                ..rule.clone()
            },
            month_days: rule.by_month_day.clone(),
            count: rule.count(),
        }
    }

    fn keeps(&self, occurrence: NaiveDateTime) -> bool {
        self.month_days.is_empty()
            || u8::try_from(occurrence.day()).is_ok_and(|day| self.month_days.contains(&day))
    }
}

/// Builds the rrule set for `rule` starting at `start`.
///
/// Date-times carry no zone, so DTSTART and UNTIL are both written as UTC to
/// keep the expansion in plain wall-clock arithmetic.
fn build_rule_set(start: NaiveDateTime, rule: &Recurrence) -> Result<RRuleSet, CoreError> {
    let rrule_string = format!(
        "DTSTART:{}Z\nRRULE:{}",
        start.format(BASIC_FORMAT),
        rule.render("Z")
    );

    rrule_string
        .parse::<RRuleSet>()
        .map_err(|e| CoreError::InvalidRule(format!("Failed to parse RRULE '{}': {}", rrule_string, e)))
}
