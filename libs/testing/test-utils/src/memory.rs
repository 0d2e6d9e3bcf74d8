//! In-memory vector store
//!
//! A deterministic stand-in for Qdrant that implements `VectorRepository`.
//! Scoring follows Qdrant's conventions: Cosine and Dot are similarities
//! (higher is closer), Euclid and Manhattan are distances (lower is closer).

use std::collections::HashMap;

use async_trait::async_trait;
use domain_vector::{
    CollectionInfo, CollectionStatus, Condition, CreateCollection, DistanceMetric,
    FieldCondition, MatchCondition, MatchValue, Payload, Point, PointId, RangeCondition,
    ScoredPoint, SearchFilter, SearchQuery, UpdateOutcome, VectorError, VectorRepository,
    VectorResult,
};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Collection {
    config: CreateCollection,
    /// Insertion order is kept so listings are stable
    points: Vec<Point>,
}

/// Thread-safe in-memory `VectorRepository`
///
/// # Example
///
/// ```
/// use domain_vector::{CreateCollection, DistanceMetric, VectorRepository};
/// use test_utils::InMemoryVectorStore;
///
/// # async fn example() {
/// let store = InMemoryVectorStore::new();
/// store
///     .create_collection(CreateCollection::new("docs", 3, DistanceMetric::Cosine))
///     .await
///     .unwrap();
/// assert_eq!(store.list_collections().await.unwrap(), vec!["docs"]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    next_operation: RwLock<u64>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn next_outcome(&self) -> UpdateOutcome {
        let mut counter = self.next_operation.write().await;
        let id = *counter;
        *counter += 1;
        UpdateOutcome::completed(Some(id))
    }

    fn not_found(name: &str) -> VectorError {
        VectorError::CollectionNotFound(name.to_string())
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorStore {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, input: CreateCollection) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&input.name) {
            return Err(VectorError::CollectionExists(input.name));
        }
        collections.insert(
            input.name.clone(),
            Collection {
                config: input,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        self.collections
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(name))
    }

    async fn collection_info(&self, name: &str) -> VectorResult<CollectionInfo> {
        let collections = self.collections.read().await;
        let collection = collections.get(name).ok_or_else(|| Self::not_found(name))?;

        Ok(CollectionInfo {
            name: name.to_string(),
            status: CollectionStatus::Green,
            points_count: collection.points.len() as u64,
            vectors_count: Some(collection.points.len() as u64),
            indexed_vectors_count: 0,
            segments_count: 1,
            vector_size: collection.config.vector_size,
            distance: collection.config.distance,
        })
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<UpdateOutcome> {
        {
            let mut collections = self.collections.write().await;
            let target = collections
                .get_mut(collection)
                .ok_or_else(|| Self::not_found(collection))?;

            let expected = target.config.vector_size as usize;
            if let Some(bad) = points.iter().find(|p| p.vector.len() != expected) {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }

            for point in points {
                match target.points.iter_mut().find(|p| p.id == point.id) {
                    Some(existing) => *existing = point,
                    None => target.points.push(point),
                }
            }
        }

        Ok(self.next_outcome().await)
    }

    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        let expected = target.config.vector_size as usize;
        if query.vector.len() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: query.vector.len(),
            });
        }

        let metric = target.config.distance;
        let mut hits: Vec<ScoredPoint> = target
            .points
            .iter()
            .filter(|p| query.filter.as_ref().is_none_or(|f| filter_matches(f, p)))
            .map(|p| {
                let value = score(metric, &query.vector, &p.vector);
                ScoredPoint::new(p.id.clone(), value, p.payload.clone())
            })
            .filter(|hit| match query.score_threshold {
                Some(t) if metric.is_similarity() => hit.score >= t,
                Some(t) => hit.score <= t,
                None => true,
            })
            .collect();

        hits.sort_by(|a, b| {
            let order = b.score.total_cmp(&a.score);
            if metric.is_similarity() { order } else { order.reverse() }
        });
        hits.truncate(query.limit as usize);
        Ok(hits)
    }

    async fn retrieve(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<Vec<Point>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        Ok(ids
            .iter()
            .filter_map(|id| target.points.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    async fn delete(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<UpdateOutcome> {
        {
            let mut collections = self.collections.write().await;
            let target = collections
                .get_mut(collection)
                .ok_or_else(|| Self::not_found(collection))?;
            target.points.retain(|p| !ids.contains(&p.id));
        }

        Ok(self.next_outcome().await)
    }
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let pairs = a.iter().zip(b);
    match metric {
        DistanceMetric::Dot => pairs.map(|(x, y)| x * y).sum(),
        DistanceMetric::Cosine => {
            let dot: f32 = pairs.map(|(x, y)| x * y).sum();
            let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
            let denom = norm(a) * norm(b);
            if denom == 0.0 { 0.0 } else { dot / denom }
        }
        DistanceMetric::Euclid => pairs.map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt(),
        DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
    }
}

fn filter_matches(filter: &SearchFilter, point: &Point) -> bool {
    filter.must.iter().all(|c| condition_matches(c, point))
        && (filter.should.is_empty() || filter.should.iter().any(|c| condition_matches(c, point)))
        && !filter.must_not.iter().any(|c| condition_matches(c, point))
}

fn condition_matches(condition: &Condition, point: &Point) -> bool {
    match condition {
        Condition::HasId { has_id } => has_id.contains(&point.id),
        Condition::IsEmpty { is_empty } => match point.payload.get(&is_empty.key) {
            None | Some(Value::Null) => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        },
        Condition::IsNull { is_null } => {
            matches!(point.payload.get(&is_null.key), Some(Value::Null))
        }
        Condition::Field(field) => field_matches(field, &point.payload),
    }
}

fn field_matches(field: &FieldCondition, payload: &Payload) -> bool {
    let Some(value) = payload.get(&field.key) else {
        return false;
    };

    // Array payload values match if any element does
    let candidates: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    candidates.iter().any(|candidate| match (&field.r#match, &field.range) {
        (Some(MatchCondition::Value { value }), _) => value_matches(value, candidate),
        (Some(MatchCondition::Any { any }), _) => any.iter().any(|v| value_matches(v, candidate)),
        (Some(MatchCondition::Text { text }), _) => {
            candidate.as_str().is_some_and(|s| s.contains(text.as_str()))
        }
        (None, Some(range)) => candidate.as_f64().is_some_and(|n| in_range(range, n)),
        (None, None) => false,
    })
}

fn value_matches(expected: &MatchValue, actual: &Value) -> bool {
    match expected {
        MatchValue::Bool(b) => actual.as_bool() == Some(*b),
        MatchValue::Integer(i) => actual.as_i64() == Some(*i),
        MatchValue::Keyword(s) => actual.as_str() == Some(s.as_str()),
    }
}

fn in_range(range: &RangeCondition, n: f64) -> bool {
    range.gt.is_none_or(|b| n > b)
        && range.gte.is_none_or(|b| n >= b)
        && range.lt.is_none_or(|b| n < b)
        && range.lte.is_none_or(|b| n <= b)
}
