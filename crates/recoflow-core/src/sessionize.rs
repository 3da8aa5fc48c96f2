//! Timeout-based session reconstruction

use crate::config::Config;
use crate::error::{RecoError, Result};
use crate::event::{Event, EventType};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};
use uuid::Uuid;

const SESSION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d0a_8e55_1c2f_7a9d_3b10);

/// A bounded run of one user's events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Chronological; includes events without an item reference
    pub events: Vec<Event>,
    pub viewed_items: Vec<String>,
    pub cart_items: Vec<String>,
    pub purchased_items: BTreeSet<String>,
    pub duration_seconds: i64,
}

impl Session {
    pub fn has_purchase(&self) -> bool {
        !self.purchased_items.is_empty()
    }
}

/// Session under construction
struct OpenSession {
    start: DateTime<Utc>,
    last: DateTime<Utc>,
    events: Vec<Event>,
    viewed: Vec<String>,
    cart: Vec<String>,
    purchased: BTreeSet<String>,
}

impl OpenSession {
    fn start(event: Event) -> (Self, Option<bool>) {
        let mut open = Self {
            start: event.timestamp,
            last: event.timestamp,
            events: Vec::new(),
            viewed: Vec::new(),
            cart: Vec::new(),
            purchased: BTreeSet::new(),
        };
        let classified = open.push(event);
        (open, classified)
    }

    /// Record an event; returns `Some(false)` when an item-bearing event had no item
    fn push(&mut self, event: Event) -> Option<bool> {
        self.last = event.timestamp;
        let classified = if event.event_type.is_item_bearing() {
            let item = event.item_id();
            let found = item.is_some();
            if let Some(item) = item {
                match event.event_type {
                    EventType::View => self.viewed.push(item),
                    EventType::AddToCart | EventType::Cart => self.cart.push(item),
                    EventType::Purchase => {
                        self.purchased.insert(item);
                    }
                    _ => {}
                }
            }
            Some(found)
        } else {
            None
        };
        self.events.push(event);
        classified
    }

    fn finish(self, user_id: &str, ordinal: usize) -> Session {
        let seed = format!(
            "{}|{}|{}",
            user_id,
            self.start.timestamp_nanos_opt().unwrap_or_default(),
            ordinal
        );
        Session {
            session_id: Uuid::new_v5(&SESSION_NAMESPACE, seed.as_bytes()).to_string(),
            user_id: user_id.to_string(),
            start: self.start,
            end: self.last,
            duration_seconds: (self.last - self.start).num_seconds(),
            events: self.events,
            viewed_items: self.viewed,
            cart_items: self.cart,
            purchased_items: self.purchased,
        }
    }
}

/// Splits per-user event streams on inactivity gaps
#[derive(Debug, Clone)]
pub struct Sessionizer {
    timeout: TimeDelta,
}

impl Sessionizer {
    pub fn new(timeout_seconds: i64) -> Result<Self> {
        if timeout_seconds <= 0 {
            return Err(RecoError::Configuration(format!(
                "session timeout must be positive, got {}",
                timeout_seconds
            )));
        }
        let timeout = TimeDelta::try_seconds(timeout_seconds).ok_or_else(|| {
            RecoError::Configuration(format!(
                "session timeout of {} seconds is out of range",
                timeout_seconds
            ))
        })?;
        Ok(Self { timeout })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.session_timeout_seconds)
    }

    pub fn timeout_seconds(&self) -> i64 {
        self.timeout.num_seconds()
    }

    /// Sessions for all users, users ascending and sessions chronological
    pub fn sessionize(&self, events: Vec<Event>) -> Vec<Session> {
        let total_events = events.len();
        let mut sessions = Vec::new();
        let mut missing_items = 0;

        for (user_id, user_events) in group_by_user(events) {
            let (user_sessions, missing) = self.sessionize_group(&user_id, user_events);
            missing_items += missing;
            sessions.extend(user_sessions);
        }

        report(total_events, sessions.len(), missing_items);
        sessions
    }

    /// Sessions for one user's events, in any order
    pub fn sessionize_user(&self, user_id: &str, events: Vec<Event>) -> Vec<Session> {
        self.sessionize_group(user_id, events).0
    }

    /// Same result as [`Sessionizer::sessionize`], with users hashed into
    /// `shards` groups processed on separate threads
    pub fn sessionize_sharded(&self, events: Vec<Event>, shards: usize) -> Vec<Session> {
        let shards = shards.max(1);
        let total_events = events.len();

        let mut partitions: Vec<BTreeMap<String, Vec<Event>>> = vec![BTreeMap::new(); shards];
        for (user_id, user_events) in group_by_user(events) {
            let mut hasher = DefaultHasher::new();
            user_id.hash(&mut hasher);
            let shard = (hasher.finish() % shards as u64) as usize;
            partitions[shard].insert(user_id, user_events);
        }

        let results: Vec<(Vec<(String, Vec<Session>)>, usize)> = std::thread::scope(|scope| {
            let handles: Vec<_> = partitions
                .into_iter()
                .map(|partition| {
                    scope.spawn(move || {
                        let mut missing_items = 0;
                        let per_user: Vec<(String, Vec<Session>)> = partition
                            .into_iter()
                            .map(|(user_id, user_events)| {
                                let (sessions, missing) =
                                    self.sessionize_group(&user_id, user_events);
                                missing_items += missing;
                                (user_id, sessions)
                            })
                            .collect();
                        (per_user, missing_items)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut missing_items = 0;
        let mut merged: BTreeMap<String, Vec<Session>> = BTreeMap::new();
        for (per_user, missing) in results {
            missing_items += missing;
            merged.extend(per_user);
        }
        let sessions: Vec<Session> = merged.into_values().flatten().collect();
        report(total_events, sessions.len(), missing_items);
        sessions
    }

    fn sessionize_group(&self, user_id: &str, mut events: Vec<Event>) -> (Vec<Session>, usize) {
        // Stable: events sharing a timestamp keep their arrival order
        events.sort_by_key(|e| e.timestamp);

        let mut sessions = Vec::new();
        let mut missing_items = 0;
        let mut current: Option<OpenSession> = None;

        for event in events {
            let classified = match current.take() {
                Some(mut open) if event.timestamp - open.last <= self.timeout => {
                    let classified = open.push(event);
                    current = Some(open);
                    classified
                }
                previous => {
                    if let Some(done) = previous {
                        let ordinal = sessions.len();
                        sessions.push(done.finish(user_id, ordinal));
                    }
                    let (open, classified) = OpenSession::start(event);
                    current = Some(open);
                    classified
                }
            };
            if classified == Some(false) {
                missing_items += 1;
            }
        }

        if let Some(done) = current {
            let ordinal = sessions.len();
            sessions.push(done.finish(user_id, ordinal));
        }
        (sessions, missing_items)
    }
}

/// Partition events into sessions using an inactivity timeout in seconds
pub fn sessionize(events: Vec<Event>, timeout_seconds: i64) -> Result<Vec<Session>> {
    Ok(Sessionizer::new(timeout_seconds)?.sessionize(events))
}

fn group_by_user(events: Vec<Event>) -> BTreeMap<String, Vec<Event>> {
    let mut groups: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for event in events {
        groups.entry(event.user_id.clone()).or_default().push(event);
    }
    groups
}

fn report(total_events: usize, total_sessions: usize, missing_items: usize) {
    if missing_items > 0 {
        warn!(
            missing_items,
            "item-bearing events without an extractable item reference"
        );
    }
    debug!(total_events, total_sessions, "sessionized events");
}
