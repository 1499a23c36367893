use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use occur_core::models::{EventFilter, RecurrenceRequest};
use std::path::PathBuf;

/// Encode recurrence rules, check occurrences and search recurring events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file, read instead of ./occur.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Encode a recurrence description into its canonical rule
    Encode(EncodeCommand),
    /// Decode a stored rule into a recurrence description
    Decode(DecodeCommand),
    /// Check whether an event occurs inside a window
    Check(CheckCommand),
    /// Search events loaded from a JSON file
    Search(SearchCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct EncodeCommand {
    /// DAILY, WEEKLY, MONTHLY or YEARLY (anything else means no recurrence)
    #[arg(short, long)]
    pub frequency: Option<String>,
    /// Step between occurrences; values of 1 or less are dropped
    #[arg(short, long, allow_negative_numbers = true)]
    pub interval: Option<i64>,
    /// Weekdays, e.g. MO,TH or MONDAY,THURSDAY
    #[arg(long = "by-day", value_delimiter = ',')]
    pub by_day: Vec<String>,
    /// Days of the month between 1 and 31
    #[arg(long = "by-month-day", value_delimiter = ',', allow_negative_numbers = true)]
    pub by_month_day: Vec<i64>,
    /// Last possible occurrence, e.g. 2025-12-31T23:59:59
    #[arg(long)]
    pub until: Option<NaiveDateTime>,
    /// Total number of occurrences
    #[arg(long, conflicts_with = "until", allow_negative_numbers = true)]
    pub count: Option<i64>,
}

impl EncodeCommand {
    pub fn to_request(&self) -> RecurrenceRequest {
        RecurrenceRequest {
            frequency: self.frequency.clone(),
            interval: self.interval,
            by_days: (!self.by_day.is_empty()).then(|| self.by_day.clone()),
            by_month_day: (!self.by_month_day.is_empty()).then(|| self.by_month_day.clone()),
            until: self.until,
            count: self.count,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct DecodeCommand {
    /// Rule such as FREQ=WEEKLY;BYDAY=MO,TH
    pub rule: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    /// Start of the first occurrence
    #[arg(long)]
    pub anchor: NaiveDateTime,
    /// Stored rule; omit for a one-off event
    #[arg(long)]
    pub rule: Option<String>,
    /// Window start (inclusive)
    #[arg(long)]
    pub from: NaiveDateTime,
    /// Window end (inclusive)
    #[arg(long)]
    pub to: NaiveDateTime,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// JSON file holding an array of events
    #[arg(short, long)]
    pub events: PathBuf,

    #[arg(long)]
    pub location: Option<String>,
    /// Minimum duration in minutes
    #[arg(long)]
    pub duration_from: Option<u32>,
    /// Maximum duration in minutes
    #[arg(long)]
    pub duration_to: Option<u32>,
    #[arg(long)]
    pub capacity_min: Option<u32>,
    #[arg(long)]
    pub capacity_max: Option<u32>,
    /// Categories; an event matches when it carries any of them
    #[arg(long = "activity-type", value_delimiter = ',')]
    pub activity_types: Vec<String>,
    /// Window start, defaults to now
    #[arg(long)]
    pub from: Option<NaiveDateTime>,
    /// Window end, defaults to the configured window after now
    #[arg(long)]
    pub to: Option<NaiveDateTime>,

    /// Print results as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub fn to_filter(&self) -> EventFilter {
        EventFilter {
            location: self.location.clone(),
            duration_from: self.duration_from,
            duration_to: self.duration_to,
            capacity_min: self.capacity_min,
            capacity_max: self.capacity_max,
            activity_types: self.activity_types.clone(),
            date_time_from: self.from,
            date_time_to: self.to,
        }
    }
}
