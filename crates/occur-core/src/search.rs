use chrono::{Local, Months, NaiveDateTime};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::CoreError;
use crate::matcher::Matcher;
use crate::models::{EventFilter, EventRecord, EventResponse, Window};
use crate::source::EventSource;

/// Configuration for event search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Window length used when the filter has no upper date bound
    pub default_window_months: u32,
    /// Upper bound on occurrence evaluations running at once per search
    pub max_concurrent_evaluations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_window_months: 2,
            max_concurrent_evaluations: 8,
        }
    }
}

impl EventFilter {
    /// Resolves the date window, filling unset bounds relative to `now`.
    pub fn window(&self, now: NaiveDateTime, config: &SearchConfig) -> Window {
        let from = self.date_time_from.unwrap_or(now);
        let to = self.date_time_to.unwrap_or_else(|| {
            now.checked_add_months(Months::new(config.default_window_months))
                .unwrap_or(NaiveDateTime::MAX)
        });
        Window::new(from, to)
    }

    /// Coarse, storage-level predicate.
    ///
    /// Recurring events are only checked against the non-date criteria; whether
    /// they occur inside `window` is decided later by the [`Matcher`].
    pub fn admits(&self, event: &EventRecord, window: &Window) -> bool {
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            if event.location != location {
                return false;
            }
        }
        if self.duration_from.is_some_and(|min| event.duration_minutes < min)
            || self.duration_to.is_some_and(|max| event.duration_minutes > max)
        {
            return false;
        }
        if self.capacity_min.is_some_and(|min| event.capacity < min)
            || self.capacity_max.is_some_and(|max| event.capacity > max)
        {
            return false;
        }
        if !self.activity_types.is_empty()
            && !event
                .activity_types
                .iter()
                .any(|category| self.activity_types.contains(category))
        {
            return false;
        }

        event.recurrence.is_some() || window.contains(event.date_time)
    }
}

/// SearchPipeline: coarse candidates from an [`EventSource`], refined per
/// recurring candidate by the [`Matcher`].
///
/// Responsibilities:
/// 1. Resolve the filter's date window
/// 2. Stream coarse-filtered candidates from the source
/// 3. Run occurrence matching on the blocking pool, bounded per search
/// 4. Drop candidates that fail to evaluate without failing the search
/// 5. Keep the source order in the result
pub struct SearchPipeline<S> {
    source: S,
    matcher: Matcher,
    config: SearchConfig,
}

impl<S: EventSource> SearchPipeline<S> {
    pub fn new(source: S, matcher: Matcher, config: SearchConfig) -> Self {
        Self {
            source,
            matcher,
            config,
        }
    }

    pub fn with_defaults(source: S) -> Self {
        Self::new(source, Matcher::default(), SearchConfig::default())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches with unset date bounds resolved against the local clock.
    pub async fn search(&self, filter: &EventFilter) -> Result<Vec<EventResponse>, CoreError> {
        self.search_at(filter, Local::now().naive_local()).await
    }

    /// Searches with unset date bounds resolved against `now`.
    ///
    /// # Returns
    /// * `Result<Vec<EventResponse>, CoreError>` - Err only when the source
    ///   cannot produce candidates at all
    pub async fn search_at(
        &self,
        filter: &EventFilter,
        now: NaiveDateTime,
    ) -> Result<Vec<EventResponse>, CoreError> {
        let window = filter.window(now, &self.config);
        tracing::debug!(from = %window.from, to = %window.to, "Searching events");

        let candidates = self.source.candidates(filter, &window).await?;
        let concurrency = self.config.max_concurrent_evaluations.max(1);

        let results: Vec<Option<EventResponse>> = candidates
            .map(|candidate| {
                let matcher = self.matcher.clone();
                async move {
                    let event = match candidate {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping unreadable candidate");
                            return None;
                        }
                    };

                    let id = event.id;
                    match tokio::task::spawn_blocking(move || evaluate(&matcher, event, &window)).await {
                        Ok(Ok(hit)) => hit,
                        Ok(Err(e)) => {
                            tracing::warn!(event_id = %id, error = %e, "Dropping candidate that failed occurrence matching");
                            None
                        }
                        Err(e) => {
                            tracing::warn!(event_id = %id, error = %e, "Occurrence evaluation task failed");
                            None
                        }
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let events: Vec<EventResponse> = results.into_iter().flatten().collect();
        tracing::debug!(matched = events.len(), "Search finished");
        Ok(events)
    }
}

/// Decides a single candidate. One-off events were already date-checked by
/// the source and pass through.
fn evaluate(
    matcher: &Matcher,
    event: EventRecord,
    window: &Window,
) -> Result<Option<EventResponse>, CoreError> {
    let recurrence = codec::decode(event.recurrence.as_deref())?;

    if let Some(rule) = recurrence.as_ref() {
        if !matcher.has_occurrence_in_window(event.date_time, Some(rule), window)? {
            return Ok(None);
        }
    }

    Ok(Some(EventResponse::from_record(event, recurrence.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatcherConfig;
    use crate::source::InMemoryEventSource;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use futures::stream::{self, BoxStream};
    use rstest::rstest;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn event(title: &str, date_time: NaiveDateTime, recurrence: Option<&str>) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            date_time,
            recurrence: recurrence.map(String::from),
            location: "Paris".to_string(),
            capacity: 10,
            duration_minutes: 60,
            ..Default::default()
        }
    }

    fn titles(events: &[EventResponse]) -> Vec<&str> {
        events.iter().map(|e| e.title.as_str()).collect()
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_window_defaults_to_now_plus_two_months() {
            let window = EventFilter::default().window(now(), &SearchConfig::default());
            assert_eq!(window.from, now());
            assert_eq!(window.to, NaiveDate::from_ymd_opt(2024, 8, 3).unwrap().and_hms_opt(9, 0, 0).unwrap());
        }

        #[test]
        fn test_window_uses_explicit_bounds() {
            let filter = EventFilter {
                date_time_from: Some(now() + Duration::days(1)),
                date_time_to: Some(now() + Duration::days(2)),
                ..Default::default()
            };
            let window = filter.window(now(), &SearchConfig::default());
            assert_eq!(window, Window::new(now() + Duration::days(1), now() + Duration::days(2)));
        }

        #[rstest]
        #[case(EventFilter { location: Some("Paris".into()), ..Default::default() }, true)]
        #[case(EventFilter { location: Some("London".into()), ..Default::default() }, false)]
        #[case(EventFilter { location: Some(String::new()), ..Default::default() }, true)]
        #[case(EventFilter { duration_from: Some(60), duration_to: Some(120), ..Default::default() }, true)]
        #[case(EventFilter { duration_from: Some(61), ..Default::default() }, false)]
        #[case(EventFilter { duration_to: Some(59), ..Default::default() }, false)]
        #[case(EventFilter { capacity_min: Some(10), capacity_max: Some(10), ..Default::default() }, true)]
        #[case(EventFilter { capacity_min: Some(11), ..Default::default() }, false)]
        #[case(EventFilter { capacity_max: Some(9), ..Default::default() }, false)]
        #[case(EventFilter { activity_types: vec!["Soccer".into(), "Hiking".into()], ..Default::default() }, true)]
        #[case(EventFilter { activity_types: vec!["Baseball".into()], ..Default::default() }, false)]
        fn test_admits_coarse_criteria(#[case] filter: EventFilter, #[case] expected: bool) {
            let mut candidate = event("match", now() + Duration::days(1), None);
            candidate.activity_types = vec!["Hiking".to_string()];
            let window = filter.window(now(), &SearchConfig::default());
            assert_eq!(filter.admits(&candidate, &window), expected);
        }

        #[test]
        fn test_admits_recurring_events_outside_window() {
            let filter = EventFilter::default();
            let window = filter.window(now(), &SearchConfig::default());
            let past_weekly = event("weekly", now() - Duration::days(90), Some("FREQ=WEEKLY"));
            let past_once = event("once", now() - Duration::days(90), None);

            assert!(filter.admits(&past_weekly, &window));
            assert!(!filter.admits(&past_once, &window));
        }
    }

    mod pipeline_tests {
        use super::*;

        #[tokio::test]
        async fn test_search_drops_recurring_events_without_occurrence() {
            let source = InMemoryEventSource::new(vec![
                event("one-off", now() + Duration::days(1), None),
                event("weekly", now() - Duration::days(30), Some("FREQ=WEEKLY")),
                event("expired", now() - Duration::days(30), Some("FREQ=DAILY;COUNT=5")),
            ]);
            let pipeline = SearchPipeline::with_defaults(source);
            let filter = EventFilter {
                date_time_from: Some(now()),
                date_time_to: Some(now() + Duration::days(7)),
                ..Default::default()
            };

            let events = pipeline.search_at(&filter, now()).await.unwrap();
            assert_eq!(titles(&events), vec!["weekly", "one-off"]);
        }

        #[tokio::test]
        async fn test_search_isolates_failing_candidate() {
            let source = InMemoryEventSource::new(vec![
                event("first", now() + Duration::days(1), None),
                event("broken", now() + Duration::days(2), Some("FREQ=SOMETIMES;BYDAY=XX")),
                event("third", now() + Duration::days(3), Some("FREQ=DAILY")),
            ]);
            let pipeline = SearchPipeline::with_defaults(source);

            let events = pipeline.search_at(&EventFilter::default(), now()).await.unwrap();
            assert_eq!(titles(&events), vec!["first", "third"]);
        }

        #[tokio::test]
        async fn test_search_keeps_source_order_at_any_concurrency() {
            let mut events = Vec::new();
            for day in 0..20 {
                events.push(event(&format!("e{day:02}"), now() + Duration::days(day), None));
            }
            let expected: Vec<String> = events.iter().map(|e| e.title.clone()).collect();

            for concurrency in [1, 4, 32] {
                let pipeline = SearchPipeline::new(
                    InMemoryEventSource::new(events.clone()),
                    Matcher::default(),
                    SearchConfig {
                        max_concurrent_evaluations: concurrency,
                        ..SearchConfig::default()
                    },
                );
                let found = pipeline.search_at(&EventFilter::default(), now()).await.unwrap();
                let found: Vec<String> = found.into_iter().map(|e| e.title).collect();
                assert_eq!(found, expected, "concurrency {}", concurrency);
            }
        }

        #[tokio::test]
        async fn test_search_finds_long_running_recurring_events() {
            let source = InMemoryEventSource::new(vec![event(
                "daily",
                now() - Duration::days(5_000),
                Some("FREQ=DAILY"),
            )]);
            let pipeline = SearchPipeline::new(
                source,
                Matcher::new(MatcherConfig {
                    lookahead_days: 100,
                    ..MatcherConfig::default()
                }),
                SearchConfig::default(),
            );

            let events = pipeline.search_at(&EventFilter::default(), now()).await.unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].title, "daily");
        }

        #[tokio::test]
        async fn test_search_decodes_recurrence_for_display() {
            let source = InMemoryEventSource::new(vec![event(
                "yoga",
                now() - Duration::days(1),
                Some("FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,TU,WE,TH,FR"),
            )]);
            let pipeline = SearchPipeline::with_defaults(source);

            let events = pipeline.search_at(&EventFilter::default(), now()).await.unwrap();
            assert_eq!(events.len(), 1);

            let recurrence = events[0].recurrence.as_ref().unwrap();
            assert_eq!(recurrence.frequency.as_deref(), Some("WEEKLY"));
            assert_eq!(recurrence.interval, Some(1));
            assert_eq!(
                recurrence.by_days.as_deref(),
                Some(&["MO".to_string(), "TU".to_string(), "WE".to_string(), "TH".to_string(), "FR".to_string()][..])
            );
        }

        /// Source whose stream yields an error in the middle.
        struct FlakySource;

        #[async_trait]
        impl EventSource for FlakySource {
            async fn candidates<'a>(
                &'a self,
                _filter: &EventFilter,
                _window: &Window,
            ) -> Result<BoxStream<'a, Result<EventRecord, CoreError>>, CoreError> {
                Ok(stream::iter(vec![
                    Ok(event("before", now() + Duration::days(1), None)),
                    Err(CoreError::Source("row decoding failed".to_string())),
                    Ok(event("after", now() + Duration::days(2), None)),
                ])
                .boxed())
            }
        }

        #[tokio::test]
        async fn test_search_skips_stream_errors() {
            let pipeline = SearchPipeline::with_defaults(FlakySource);
            let events = pipeline.search_at(&EventFilter::default(), now()).await.unwrap();
            assert_eq!(titles(&events), vec!["before", "after"]);
        }

        /// Source that cannot be opened.
        struct OfflineSource;

        #[async_trait]
        impl EventSource for OfflineSource {
            async fn candidates<'a>(
                &'a self,
                _filter: &EventFilter,
                _window: &Window,
            ) -> Result<BoxStream<'a, Result<EventRecord, CoreError>>, CoreError> {
                Err(CoreError::Source("connection refused".to_string()))
            }
        }

        #[tokio::test]
        async fn test_search_propagates_source_failure() {
            let pipeline = SearchPipeline::with_defaults(OfflineSource);
            let result = pipeline.search_at(&EventFilter::default(), now()).await;
            assert!(matches!(result, Err(CoreError::Source(_))));
        }
    }
}
