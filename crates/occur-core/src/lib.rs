//! # Occur Core Library
//!
//! Recurrence rules for calendar events: a codec between structured
//! recurrence descriptions and canonical RRULE text, an occurrence matcher
//! that answers "does this event happen inside this window?", and a search
//! pipeline that refines coarse storage candidates with that matcher.
//!
//! ## Core Modules
//!
//! - [`codec`]: Encoding and decoding of canonical RRULE strings
//! - [`matcher`]: Bounded occurrence expansion against a closed window
//! - [`search`]: Filter resolution and the concurrent search pipeline
//! - [`source`]: The storage seam that yields candidate events
//! - [`models`]: Recurrence, event and filter types
//! - [`config`]: Matcher and search tunables
//! - [`error`]: Error types shared by every module
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use occur_core::{
//!     codec, models::{EventFilter, RecurrenceRequest},
//!     search::SearchPipeline, source::InMemoryEventSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), occur_core::error::CoreError> {
//!     let request = RecurrenceRequest {
//!         frequency: Some("WEEKLY".to_string()),
//!         by_days: Some(vec!["MO".to_string(), "WE".to_string()]),
//!         count: Some(10),
//!         ..Default::default()
//!     };
//!     let encoded = codec::encode(&request)?;
//!     println!("{:?}", encoded.rule());
//!
//!     let source = InMemoryEventSource::from_json_file("events.json")?;
//!     let pipeline = SearchPipeline::with_defaults(source);
//!     for event in pipeline.search(&EventFilter::default()).await? {
//!         println!("{} at {}", event.title, event.date_time);
//!     }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod search;
pub mod source;

pub use codec::{CanonicalRule, Encoded};
pub use config::Config;
pub use error::CoreError;
pub use matcher::{Matcher, MatcherConfig};
pub use search::{SearchConfig, SearchPipeline};
pub use source::{EventSource, InMemoryEventSource};
