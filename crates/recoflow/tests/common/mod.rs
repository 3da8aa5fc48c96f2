#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use recoflow_core::{Event, ScoreMap};

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

pub fn view(user: &str, seconds: i64, item: &str) -> Event {
    Event::with_item(user, "view", at(seconds), item)
}

pub fn purchase(user: &str, seconds: i64, item: &str) -> Event {
    Event::with_item(user, "purchase", at(seconds), item)
}

pub fn add_to_cart(user: &str, seconds: i64, item: &str) -> Event {
    Event::with_item(user, "add_to_cart", at(seconds), item)
}

pub fn scores(pairs: &[(&str, f64)]) -> ScoreMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Three users with interleaved activity across several sessions
pub fn sample_events() -> Vec<Event> {
    vec![
        view("u1", 0, "10"),
        view("u2", 30, "20"),
        add_to_cart("u1", 60, "10"),
        purchase("u1", 120, "10"),
        view("u2", 5_000, "30"),
        view("u3", 100, "10"),
        view("u1", 9_000, "20"),
        purchase("u2", 5_100, "30"),
        view("u3", 4_000, "40"),
    ]
}
