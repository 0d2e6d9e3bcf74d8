use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::filter::SearchFilter;

/// Point metadata: an arbitrary JSON object
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Distance metric for similarity calculations
///
/// Names match Qdrant's own spelling so they round-trip through tool schemas.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

impl DistanceMetric {
    /// Higher score means closer (Cosine, Dot). For Euclid and Manhattan the
    /// score is a distance and lower is closer.
    pub fn is_similarity(&self) -> bool {
        matches!(self, DistanceMetric::Cosine | DistanceMetric::Dot)
    }
}

/// Point identifier
///
/// Qdrant accepts unsigned integers or UUID strings; other strings are
/// forwarded as-is and rejected (or not) by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Text(String),
}

impl PointId {
    /// Build an id from caller-supplied text.
    ///
    /// A string made only of ASCII digits that fits in a `u64` becomes a
    /// numeric id, everything else stays a string. The store keys numeric and
    /// string ids separately, so `"42"` and `42` must resolve to the same point.
    pub fn coerce(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(num) = raw.parse::<u64>() {
                return PointId::Num(num);
            }
        }
        PointId::Text(raw)
    }
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        PointId::Num(id)
    }
}

impl From<&str> for PointId {
    fn from(id: &str) -> Self {
        PointId::Text(id.to_string())
    }
}

impl From<String> for PointId {
    fn from(id: String) -> Self {
        PointId::Text(id)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A stored point: id, dense vector and payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: Payload,
}

impl Point {
    pub fn new(id: PointId, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            payload: Payload::new(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Search hit returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    pub payload: Payload,
}

impl ScoredPoint {
    pub fn new(id: PointId, score: f32, payload: Payload) -> Self {
        Self { id, score, payload }
    }
}

/// Input for creating a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    pub vector_size: u64,
    pub distance: DistanceMetric,
}

impl CreateCollection {
    pub fn new(name: impl Into<String>, vector_size: u64, distance: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            vector_size,
            distance,
        }
    }
}

/// Collection information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub status: CollectionStatus,
    pub points_count: u64,
    /// Stored vector count, when the backend reports one
    pub vectors_count: Option<u64>,
    pub indexed_vectors_count: u64,
    pub segments_count: u64,
    pub vector_size: u64,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Green,
    Yellow,
    Grey,
    Red,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Green => "green",
            CollectionStatus::Yellow => "yellow",
            CollectionStatus::Grey => "grey",
            CollectionStatus::Red => "red",
        }
    }
}

/// Result of a write (upsert/delete) as reported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub operation_id: Option<u64>,
    pub status: UpdateStatus,
}

impl UpdateOutcome {
    pub fn completed(operation_id: Option<u64>) -> Self {
        Self {
            operation_id,
            status: UpdateStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Acknowledged,
    Completed,
    ClockRejected,
    Unknown,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Acknowledged => "acknowledged",
            UpdateStatus::Completed => "completed",
            UpdateStatus::ClockRejected => "clock_rejected",
            UpdateStatus::Unknown => "unknown",
        }
    }
}

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: u64,
    pub score_threshold: Option<f32>,
    pub filter: Option<SearchFilter>,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            score_threshold: None,
            filter: None,
        }
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}
