//! Configuration for the recommendation pipeline

use crate::error::{RecoError, Result};
use crate::event::EventType;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

pub const ENV_SESSION_TIMEOUT: &str = "RECOFLOW_SESSION_TIMEOUT_SECONDS";
pub const ENV_TOP_K: &str = "RECOFLOW_TOP_K";
pub const ENV_TRENDING_WINDOW: &str = "RECOFLOW_TRENDING_WINDOW_HOURS";

/// Interaction weight per event type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWeights {
    pub weights: HashMap<String, f64>,
    pub default: f64,
}

impl EventWeights {
    pub fn new() -> Self {
        let mut weights = HashMap::new();
        weights.insert("view".to_string(), 1.0);
        weights.insert("click".to_string(), 0.5);
        weights.insert("add_to_cart".to_string(), 2.0);
        weights.insert("purchase".to_string(), 5.0);

        Self {
            weights,
            default: 0.0,
        }
    }

    /// Weight for a mapped event type, `None` when the table has no entry
    pub fn get_weight(&self, event_type: &EventType) -> Option<f64> {
        self.weights.get(event_type.as_str()).copied()
    }

    pub fn weight_or_default(&self, event_type: &EventType) -> f64 {
        self.get_weight(event_type).unwrap_or(self.default)
    }
}

impl Default for EventWeights {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inactivity gap (seconds) that closes a session
    pub session_timeout_seconds: i64,

    /// Interaction weight per event type
    pub event_weights: EventWeights,

    /// Blend weight per named score source
    pub blend_weights: BTreeMap<String, f64>,

    /// Ranking length
    pub top_k: i64,

    /// Lookback window for trending counts
    pub trending_window_hours: i64,

    /// Maximum input length of next-item sequence examples
    pub sequence_max_len: usize,
}

impl Config {
    pub fn new() -> Self {
        let mut blend_weights = BTreeMap::new();
        blend_weights.insert("collaborative".to_string(), 0.6);
        blend_weights.insert("content".to_string(), 0.3);
        blend_weights.insert("trending".to_string(), 0.1);

        Self {
            session_timeout_seconds: 1800,
            event_weights: EventWeights::new(),
            blend_weights,
            top_k: 10,
            trending_window_hours: 24,
            sequence_max_len: 50,
        }
    }

    /// Parse a JSON config document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| RecoError::Configuration(format!("invalid config document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `RECOFLOW_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        if let Some(timeout) = env_override::<i64>(ENV_SESSION_TIMEOUT)? {
            config.session_timeout_seconds = timeout;
        }
        if let Some(top_k) = env_override::<i64>(ENV_TOP_K)? {
            config.top_k = top_k;
        }
        if let Some(hours) = env_override::<i64>(ENV_TRENDING_WINDOW)? {
            config.trending_window_hours = hours;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_timeout_seconds <= 0 {
            return Err(RecoError::Configuration(format!(
                "session timeout must be positive, got {}",
                self.session_timeout_seconds
            )));
        }
        if TimeDelta::try_seconds(self.session_timeout_seconds).is_none() {
            return Err(RecoError::Configuration(format!(
                "session timeout of {} seconds is out of range",
                self.session_timeout_seconds
            )));
        }
        if self.trending_window_hours <= 0 {
            return Err(RecoError::Configuration(format!(
                "trending window must be positive, got {}",
                self.trending_window_hours
            )));
        }
        self.trending_window()?;
        for (name, &weight) in &self.blend_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecoError::Configuration(format!(
                    "blend weight for '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        for (name, &weight) in &self.event_weights.weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecoError::Configuration(format!(
                    "event weight for '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        let default = self.event_weights.default;
        if !default.is_finite() || default < 0.0 {
            return Err(RecoError::Configuration(format!(
                "default event weight must be a non-negative number, got {}",
                default
            )));
        }
        Ok(())
    }

    /// Trending lookback as a duration
    pub fn trending_window(&self) -> Result<TimeDelta> {
        TimeDelta::try_hours(self.trending_window_hours).ok_or_else(|| {
            RecoError::Configuration(format!(
                "trending window of {} hours is out of range",
                self.trending_window_hours
            ))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            RecoError::Configuration(format!("{} has an unparseable value '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
