//! Session-level feature rows

use crate::error::{RecoError, Result};
use crate::event::Event;
use crate::sessionize::Session;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const UNKNOWN_VALUE: &str = "unknown";

/// Per-event attribute a feature can aggregate over
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    EventType,
    /// Extracted item reference
    Item,
    Metadata(String),
}

impl Column {
    pub fn name(&self) -> String {
        match self {
            Column::EventType => "event_type".to_string(),
            Column::Item => "item".to_string(),
            Column::Metadata(key) => format!("metadata.{}", key),
        }
    }

    fn value(&self, event: &Event) -> Option<String> {
        match self {
            Column::EventType => Some(event.event_type.as_str().to_string()),
            Column::Item => event.item_id(),
            Column::Metadata(key) => event.metadata_value(key),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureOptions {
    /// Column whose values are counted per session
    pub count_by: Column,
    /// Column used for the distinct-item count; omitted when absent from input
    pub item_column: Option<Column>,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            count_by: Column::EventType,
            item_column: Some(Column::Item),
        }
    }
}

/// One row of session aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeatureRow {
    pub session_id: String,
    pub user_id: String,
    pub num_events: usize,
    pub duration_seconds: i64,
    pub event_counts: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_item_count: Option<usize>,
    pub start_hour: u32,
    /// 0 = Monday
    pub start_day_of_week: u32,
}

/// Columns observed across an input batch
struct Schema {
    has_events: bool,
    has_items: bool,
    metadata_keys: BTreeSet<String>,
}

impl Schema {
    fn of(sessions: &[Session]) -> Self {
        let mut schema = Schema {
            has_events: false,
            has_items: false,
            metadata_keys: BTreeSet::new(),
        };
        for event in sessions.iter().flat_map(|s| &s.events) {
            schema.has_events = true;
            if !schema.has_items && event.item_id().is_some() {
                schema.has_items = true;
            }
            for key in event.metadata_keys() {
                if !schema.metadata_keys.contains(key) {
                    schema.metadata_keys.insert(key.to_string());
                }
            }
        }
        schema
    }

    fn contains(&self, column: &Column) -> bool {
        match column {
            Column::EventType => self.has_events,
            Column::Item => self.has_items,
            Column::Metadata(key) => self.metadata_keys.contains(key),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    options: FeatureOptions,
}

impl FeatureExtractor {
    pub fn new(options: FeatureOptions) -> Self {
        Self { options }
    }

    /// One row per session, in input order
    pub fn extract(&self, sessions: &[Session]) -> Result<Vec<SessionFeatureRow>> {
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let schema = Schema::of(sessions);
        if !schema.contains(&self.options.count_by) {
            return Err(RecoError::MissingColumn(self.options.count_by.name()));
        }
        let item_column = self
            .options
            .item_column
            .as_ref()
            .filter(|column| schema.contains(column));

        Ok(sessions
            .iter()
            .map(|session| self.extract_row(session, item_column))
            .collect())
    }

    fn extract_row(&self, session: &Session, item_column: Option<&Column>) -> SessionFeatureRow {
        let mut event_counts: BTreeMap<String, usize> = BTreeMap::new();
        for event in &session.events {
            let key = self
                .options
                .count_by
                .value(event)
                .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
            *event_counts.entry(key).or_insert(0) += 1;
        }

        let unique_item_count = item_column.map(|column| {
            session
                .events
                .iter()
                .filter_map(|event| column.value(event))
                .collect::<BTreeSet<_>>()
                .len()
        });

        SessionFeatureRow {
            session_id: session.session_id.clone(),
            user_id: session.user_id.clone(),
            num_events: session.events.len(),
            duration_seconds: session.duration_seconds,
            event_counts,
            unique_item_count,
            start_hour: session.start.hour(),
            start_day_of_week: session.start.weekday().num_days_from_monday(),
        }
    }
}

/// Feature rows with the default options
pub fn extract_features(sessions: &[Session]) -> Result<Vec<SessionFeatureRow>> {
    FeatureExtractor::default().extract(sessions)
}
