use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::Path;

use crate::error::CoreError;
use crate::models::{EventFilter, EventRecord, Window};

/// Storage collaborator that hands coarse-filtered candidates to the search
/// pipeline.
///
/// Implementations apply [`EventFilter::admits`] (or an equivalent query) and
/// yield candidates in ascending `date_time` order. Recurring events must be
/// yielded regardless of the window; the pipeline decides whether they occur
/// in it.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn candidates<'a>(
        &'a self,
        filter: &EventFilter,
        window: &Window,
    ) -> Result<BoxStream<'a, Result<EventRecord, CoreError>>, CoreError>;
}

/// Event source over a list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSource {
    events: Vec<EventRecord>,
}

impl InMemoryEventSource {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    /// Loads events from a JSON array of [`EventRecord`]s.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn candidates<'a>(
        &'a self,
        filter: &EventFilter,
        window: &Window,
    ) -> Result<BoxStream<'a, Result<EventRecord, CoreError>>, CoreError> {
        let mut matching: Vec<EventRecord> = self
            .events
            .iter()
            .filter(|event| filter.admits(event, window))
            .cloned()
            .collect();
        matching.sort_by_key(|event| event.date_time);

        tracing::debug!(
            total = self.events.len(),
            candidates = matching.len(),
            "Coarse filter applied"
        );

        Ok(stream::iter(matching.into_iter().map(Ok)).boxed())
    }
}
