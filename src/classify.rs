//! Bucket classification of entropy scores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload fields carried by a bucket (`strength`, `color`, custom keys).
pub type Payload = Map<String, Value>;

/// A half-open `[min, max)` range with arbitrary payload fields.
///
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Adds a payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Lower bound inclusive, upper bound exclusive.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value < max)
    }
}

/// Returns a copy of the payload of the first bucket containing `value`.
///
/// Buckets are tried in declared order, so an earlier bucket shadows any
/// later one it overlaps. `None` means `value` falls outside every range.
pub fn classify(value: f64, buckets: &[Bucket]) -> Option<Payload> {
    buckets
        .iter()
        .find(|bucket| bucket.contains(value))
        .map(|bucket| bucket.payload.clone())
}

/// The stock four-rung ladder: poor / ok / good / excellent at 45, 60 and 75 bits.
pub fn default_buckets() -> Vec<Bucket> {
    vec![
        Bucket::new().max(45.0).with("strength", "poor").with("color", "#d00"),
        Bucket::new()
            .min(45.0)
            .max(60.0)
            .with("strength", "ok")
            .with("color", "#f80"),
        Bucket::new()
            .min(60.0)
            .max(75.0)
            .with("strength", "good")
            .with("color", "#8c0"),
        Bucket::new()
            .min(75.0)
            .with("strength", "excellent")
            .with("color", "#0c8"),
    ]
}
