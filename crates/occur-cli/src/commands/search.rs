use anyhow::{Context, Result};
use occur_core::config::Config;
use occur_core::matcher::Matcher;
use occur_core::search::SearchPipeline;
use occur_core::source::InMemoryEventSource;

use crate::cli::SearchCommand;
use crate::views::table::display_events;

pub async fn search_events(command: SearchCommand, config: &Config) -> Result<()> {
    let source = InMemoryEventSource::from_json_file(&command.events)
        .with_context(|| format!("Failed to load events from {}", command.events.display()))?;
    if source.is_empty() {
        tracing::warn!(path = %command.events.display(), "Event file contains no events");
    } else {
        tracing::debug!(events = source.len(), "Loaded events");
    }

    let pipeline = SearchPipeline::new(
        source,
        Matcher::new(config.matcher.clone()),
        config.search.clone(),
    );
    let events = pipeline.search(&command.to_filter()).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        display_events(&events);
    }
    Ok(())
}
