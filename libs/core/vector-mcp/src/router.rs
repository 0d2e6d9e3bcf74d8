use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use domain_vector::{
    CollectionInfo, CreateCollection, Point, ScoredPoint, SearchQuery, UpdateOutcome,
    VectorError, VectorRepository,
};
use serde_json::{Value, json};
use tracing::{debug, error, instrument, warn};

use crate::catalogue::{CATALOGUE, DEFAULT_SCORE_THRESHOLD, OperationDescriptor};
use crate::envelope::Envelope;
use crate::error::{Error, ErrorContext, Result};
use crate::request::{
    CollectionNameArgs, CreateCollectionArgs, Operation, PointIdsArgs, SearchVectorsArgs,
    UpsertVectorsArgs,
};

/// Dispatches named operations to the vector store
///
/// The store is injected once and shared by every call; the router itself
/// holds no other state.
pub struct OperationRouter<R: VectorRepository + ?Sized> {
    store: Arc<R>,
}

impl<R: VectorRepository + ?Sized> Clone for OperationRouter<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: VectorRepository + ?Sized> OperationRouter<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Every operation this router accepts
    pub fn catalogue(&self) -> &'static [OperationDescriptor] {
        CATALOGUE
    }

    /// Validate and run one call. Never fails: problems come back as an
    /// error envelope.
    #[instrument(skip(self, arguments), fields(operation = %name))]
    pub async fn call(&self, name: &str, arguments: &Value) -> Envelope {
        let operation = match Operation::parse(name, arguments) {
            Ok(operation) => operation,
            Err(err) => {
                warn!(error = %err, "Rejected operation call");
                return Envelope::error(err.to_string());
            }
        };

        let result = self.dispatch(operation).await;
        if let Err(err) = &result {
            if err.is_validation() {
                warn!(error = %err, "Invalid operation arguments");
            } else {
                error!(error = %err, "Operation failed");
            }
        }
        result.into()
    }

    pub async fn dispatch(&self, operation: Operation) -> Result<Value> {
        debug!(operation = operation.name(), "Dispatching operation");

        match operation {
            Operation::ListCollections => self.list_collections().await,
            Operation::CreateCollection(args) => self.create_collection(args).await,
            Operation::DeleteCollection(args) => self.delete_collection(args).await,
            Operation::GetCollectionInfo(args) => self.get_collection_info(args).await,
            Operation::UpsertVectors(args) => self.upsert_vectors(args).await,
            Operation::SearchVectors(args) => self.search_vectors(args).await,
            Operation::DeleteVectors(args) => self.delete_vectors(args).await,
            Operation::GetVectors(args) => self.get_vectors(args).await,
            Operation::HealthCheck => Ok(self.health_check().await),
        }
    }

    async fn list_collections(&self) -> Result<Value> {
        let collections = self
            .store
            .list_collections()
            .await
            .with_context("Error listing collections")?;

        Ok(json!({
            "collections": collections,
            "count": collections.len()
        }))
    }

    async fn create_collection(&self, args: CreateCollectionArgs) -> Result<Value> {
        const CONTEXT: &str = "Error creating collection";

        if self
            .store
            .collection_exists(&args.name)
            .await
            .with_context(CONTEXT)?
        {
            return Err(VectorError::CollectionExists(args.name)).with_context(CONTEXT);
        }

        let input = CreateCollection::new(&args.name, args.vector_size, args.distance);
        self.store
            .create_collection(input)
            .await
            .with_context(CONTEXT)?;

        Ok(json!({
            "message": format!("Collection '{}' created successfully", args.name),
            "collection": {
                "name": args.name,
                "vector_size": args.vector_size,
                "distance": args.distance.to_string()
            }
        }))
    }

    async fn delete_collection(&self, args: CollectionNameArgs) -> Result<Value> {
        self.store
            .delete_collection(&args.name)
            .await
            .with_context("Error deleting collection")?;

        Ok(json!({
            "message": format!("Collection '{}' deleted successfully", args.name)
        }))
    }

    async fn get_collection_info(&self, args: CollectionNameArgs) -> Result<Value> {
        let info = self
            .store
            .collection_info(&args.name)
            .await
            .with_context("Error getting collection info")?;

        Ok(json!({ "collection": collection_json(&info) }))
    }

    async fn upsert_vectors(&self, args: UpsertVectorsArgs) -> Result<Value> {
        const CONTEXT: &str = "Error upserting vectors";

        let dimension = uniform_dimension(&args.points)?;
        let info = self
            .store
            .collection_info(&args.collection)
            .await
            .with_context(CONTEXT)?;
        check_dimension(&info, dimension).with_context(CONTEXT)?;

        let count = args.points.len();
        let outcome = self
            .store
            .upsert(&args.collection, args.points)
            .await
            .with_context(CONTEXT)?;

        Ok(update_json(
            format!(
                "Upserted {} vectors to collection '{}'",
                count, args.collection
            ),
            count,
            &outcome,
        ))
    }

    /// Results are ordered best-first for the collection's metric and never
    /// exceed `limit`. An omitted threshold defaults to 0.0 only for
    /// similarity metrics; for distance metrics it means "no bound".
    async fn search_vectors(&self, args: SearchVectorsArgs) -> Result<Value> {
        const CONTEXT: &str = "Error searching vectors";

        let info = self
            .store
            .collection_info(&args.collection)
            .await
            .with_context(CONTEXT)?;
        check_dimension(&info, args.query_vector.len()).with_context(CONTEXT)?;

        let similarity = info.distance.is_similarity();
        let score_threshold = match args.score_threshold {
            Some(threshold) => Some(threshold),
            None if similarity => Some(DEFAULT_SCORE_THRESHOLD as f32),
            None => None,
        };

        let mut query = SearchQuery::new(args.query_vector, args.limit);
        if let Some(threshold) = score_threshold {
            query = query.with_score_threshold(threshold);
        }
        if let Some(filter) = args.filter {
            query = query.with_filter(filter);
        }

        let mut hits = self
            .store
            .search(&args.collection, query)
            .await
            .with_context(CONTEXT)?;
        rank(&mut hits, similarity, args.limit);

        let results: Vec<Value> = hits
            .iter()
            .map(|hit| {
                json!({
                    "id": hit.id,
                    "score": hit.score,
                    "payload": hit.payload
                })
            })
            .collect();

        Ok(json!({
            "query": {
                "collection": args.collection,
                "limit": args.limit,
                "score_threshold": score_threshold
            },
            "count": results.len(),
            "results": results
        }))
    }

    async fn delete_vectors(&self, args: PointIdsArgs) -> Result<Value> {
        let count = args.ids.len();
        let outcome = self
            .store
            .delete(&args.collection, args.ids)
            .await
            .with_context("Error deleting vectors")?;

        Ok(update_json(
            format!(
                "Deleted {} vectors from collection '{}'",
                count, args.collection
            ),
            count,
            &outcome,
        ))
    }

    /// Ids with no stored point are silently left out of `vectors`.
    async fn get_vectors(&self, args: PointIdsArgs) -> Result<Value> {
        let points = self
            .store
            .retrieve(&args.collection, args.ids)
            .await
            .with_context("Error getting vectors")?;

        let vectors: Vec<Value> = points
            .iter()
            .map(|point| {
                json!({
                    "id": point.id,
                    "vector": point.vector,
                    "payload": point.payload
                })
            })
            .collect();

        Ok(json!({
            "count": vectors.len(),
            "vectors": vectors
        }))
    }

    /// A failing store is reported as data, not as an error envelope.
    async fn health_check(&self) -> Value {
        let timestamp = Utc::now().to_rfc3339();

        match self.store.list_collections().await {
            Ok(collections) => json!({
                "status": "healthy",
                "message": "Qdrant connection is working",
                "collections_count": collections.len(),
                "timestamp": timestamp
            }),
            Err(err) => {
                warn!(error = %err, "Health check failed");
                json!({
                    "status": "unhealthy",
                    "message": format!("Qdrant connection failed: {}", err),
                    "timestamp": timestamp
                })
            }
        }
    }
}

fn collection_json(info: &CollectionInfo) -> Value {
    json!({
        "name": info.name,
        "status": info.status.as_str(),
        "points_count": info.points_count,
        "vectors_count": info.vectors_count,
        "indexed_vectors_count": info.indexed_vectors_count,
        "segments_count": info.segments_count,
        "config": {
            "params": {
                "vectors": {
                    "size": info.vector_size,
                    "distance": info.distance.to_string()
                }
            }
        }
    })
}

fn update_json(message: String, count: usize, outcome: &UpdateOutcome) -> Value {
    json!({
        "message": message,
        "count": count,
        "operation_id": outcome.operation_id,
        "status_info": outcome.status.as_str()
    })
}

/// All vectors in one upsert must share a length
fn uniform_dimension(points: &[Point]) -> Result<usize> {
    let expected = points.first().map(|p| p.vector.len()).unwrap_or_default();

    match points.iter().position(|p| p.vector.len() != expected) {
        None => Ok(expected),
        Some(index) => Err(Error::validation(
            format!("vectors[{}].vector", index),
            VectorError::DimensionMismatch {
                expected,
                actual: points[index].vector.len(),
            }
            .to_string(),
        )),
    }
}

/// A collection reporting size 0 has no single dense vector config; let the
/// store decide.
fn check_dimension(info: &CollectionInfo, actual: usize) -> std::result::Result<(), VectorError> {
    let expected = info.vector_size as usize;
    if expected != 0 && expected != actual {
        return Err(VectorError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Stable sort best-first, then cut to `limit`
fn rank(hits: &mut Vec<ScoredPoint>, similarity: bool, limit: u64) {
    hits.sort_by(|a, b| {
        let order = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        if similarity { order } else { order.reverse() }
    });
    hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_vector::{
        CollectionStatus, DistanceMetric, MockVectorRepository, Payload, PointId, UpdateStatus,
    };
    use mockall::predicate::eq;

    fn info(name: &str, size: u64, distance: DistanceMetric) -> CollectionInfo {
        CollectionInfo {
            name: name.to_string(),
            status: CollectionStatus::Green,
            points_count: 3,
            vectors_count: None,
            indexed_vectors_count: 0,
            segments_count: 1,
            vector_size: size,
            distance,
        }
    }

    fn hit(id: u64, score: f32) -> ScoredPoint {
        ScoredPoint::new(PointId::Num(id), score, Payload::new())
    }

    fn router(mock: MockVectorRepository) -> OperationRouter<MockVectorRepository> {
        OperationRouter::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_list_collections() {
        let mut mock = MockVectorRepository::new();
        mock.expect_list_collections()
            .times(1)
            .returning(|| Ok(vec!["a".to_string(), "b".to_string()]));

        let envelope = router(mock).call("list_collections", &json!({})).await;
        assert!(envelope.is_success());
        assert_eq!(
            envelope.data.unwrap(),
            json!({ "collections": ["a", "b"], "count": 2 })
        );
    }

    #[tokio::test]
    async fn test_list_collections_store_failure() {
        let mut mock = MockVectorRepository::new();
        mock.expect_list_collections()
            .returning(|| Err(VectorError::Qdrant("connection refused".to_string())));

        let envelope = router(mock).call("list_collections", &Value::Null).await;
        assert_eq!(
            envelope.message.as_deref(),
            Some("Error listing collections: Qdrant error: connection refused")
        );
    }

    #[tokio::test]
    async fn test_create_collection() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_exists()
            .with(eq("docs"))
            .returning(|_| Ok(false));
        mock.expect_create_collection()
            .with(eq(CreateCollection::new("docs", 4, DistanceMetric::Dot)))
            .times(1)
            .returning(|_| Ok(()));

        let envelope = router(mock)
            .call(
                "create_collection",
                &json!({ "name": "docs", "vector_size": 4, "distance": "dot" }),
            )
            .await;
        assert_eq!(
            envelope.data.unwrap(),
            json!({
                "message": "Collection 'docs' created successfully",
                "collection": { "name": "docs", "vector_size": 4, "distance": "Dot" }
            })
        );
    }

    #[tokio::test]
    async fn test_create_collection_name_collision() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_exists().returning(|_| Ok(true));
        mock.expect_create_collection().never();

        let envelope = router(mock)
            .call("create_collection", &json!({ "name": "docs", "vector_size": 4 }))
            .await;
        assert!(!envelope.is_success());
        assert!(envelope
            .message
            .unwrap()
            .contains("Collection 'docs' already exists"));
    }

    #[tokio::test]
    async fn test_delete_collection_not_found() {
        let mut mock = MockVectorRepository::new();
        mock.expect_delete_collection()
            .with(eq("ghost"))
            .returning(|name| Err(VectorError::CollectionNotFound(name.to_string())));

        let envelope = router(mock)
            .call("delete_collection", &json!({ "name": "ghost" }))
            .await;
        assert_eq!(
            envelope.message.as_deref(),
            Some("Error deleting collection: Collection not found: ghost")
        );
    }

    #[tokio::test]
    async fn test_get_collection_info_shape() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 128, DistanceMetric::Cosine)));

        let envelope = router(mock)
            .call("get_collection_info", &json!({ "name": "docs" }))
            .await;
        let data = envelope.data.unwrap();
        assert_eq!(data["collection"]["status"], "green");
        assert_eq!(data["collection"]["points_count"], 3);
        // Unknown counts stay in the payload as null
        assert_eq!(data["collection"].get("vectors_count"), Some(&Value::Null));
        assert_eq!(data["collection"]["config"]["params"]["vectors"]["size"], 128);
        assert_eq!(
            data["collection"]["config"]["params"]["vectors"]["distance"],
            "Cosine"
        );
    }

    #[tokio::test]
    async fn test_upsert_reports_outcome() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 2, DistanceMetric::Cosine)));
        mock.expect_upsert()
            .withf(|collection, points| collection == "docs" && points.len() == 2)
            .returning(|_, _| Ok(UpdateOutcome::completed(Some(11))));

        let envelope = router(mock)
            .call(
                "upsert_vectors",
                &json!({
                    "collection": "docs",
                    "vectors": [
                        { "id": 1, "vector": [0.1, 0.2] },
                        { "id": "2", "vector": [0.3, 0.4], "payload": { "k": "v" } }
                    ]
                }),
            )
            .await;
        assert_eq!(
            envelope.data.unwrap(),
            json!({
                "message": "Upserted 2 vectors to collection 'docs'",
                "count": 2,
                "operation_id": 11,
                "status_info": "completed"
            })
        );
    }

    #[tokio::test]
    async fn test_upsert_mixed_lengths_never_reaches_store() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info().never();
        mock.expect_upsert().never();

        let envelope = router(mock)
            .call(
                "upsert_vectors",
                &json!({
                    "collection": "docs",
                    "vectors": [
                        { "id": 1, "vector": [0.1, 0.2] },
                        { "id": 2, "vector": [0.3] }
                    ]
                }),
            )
            .await;
        let message = envelope.message.unwrap();
        assert!(message.contains("vectors[1].vector"));
        assert!(message.contains("expected 2, got 1"));
    }

    #[tokio::test]
    async fn test_upsert_dimension_mismatch_with_collection() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 128, DistanceMetric::Cosine)));
        mock.expect_upsert().never();

        let envelope = router(mock)
            .call(
                "upsert_vectors",
                &json!({ "collection": "docs", "vectors": [{ "id": 1, "vector": [0.1, 0.2] }] }),
            )
            .await;
        assert_eq!(
            envelope.message.as_deref(),
            Some("Error upserting vectors: Vector dimension mismatch: expected 128, got 2")
        );
    }

    #[tokio::test]
    async fn test_search_orders_and_truncates() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 2, DistanceMetric::Cosine)));
        mock.expect_search()
            .withf(|_, query| query.limit == 2 && query.score_threshold == Some(0.0))
            .returning(|_, _| Ok(vec![hit(1, 0.2), hit(2, 0.9), hit(3, 0.5)]));

        let envelope = router(mock)
            .call(
                "search_vectors",
                &json!({ "collection": "docs", "query_vector": [1.0, 0.0], "limit": 2 }),
            )
            .await;
        let data = envelope.data.unwrap();
        assert_eq!(data["count"], 2);
        assert_eq!(data["results"][0]["id"], 2);
        assert_eq!(data["results"][1]["id"], 3);
        assert_eq!(
            data["query"],
            json!({ "collection": "docs", "limit": 2, "score_threshold": 0.0 })
        );
    }

    #[tokio::test]
    async fn test_search_distance_metric_has_no_default_threshold() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 2, DistanceMetric::Euclid)));
        mock.expect_search()
            .withf(|_, query| query.score_threshold.is_none())
            .returning(|_, _| Ok(vec![hit(1, 3.0), hit(2, 0.5)]));

        let envelope = router(mock)
            .call(
                "search_vectors",
                &json!({ "collection": "docs", "query_vector": [1.0, 0.0] }),
            )
            .await;
        let data = envelope.data.unwrap();
        assert_eq!(data["results"][0]["id"], 2);
        assert_eq!(data["query"]["score_threshold"], Value::Null);
    }

    #[tokio::test]
    async fn test_search_dimension_mismatch() {
        let mut mock = MockVectorRepository::new();
        mock.expect_collection_info()
            .returning(|name| Ok(info(name, 3, DistanceMetric::Cosine)));
        mock.expect_search().never();

        let envelope = router(mock)
            .call(
                "search_vectors",
                &json!({ "collection": "docs", "query_vector": [1.0] }),
            )
            .await;
        assert!(envelope
            .message
            .unwrap()
            .starts_with("Error searching vectors: Vector dimension mismatch"));
    }

    #[tokio::test]
    async fn test_delete_vectors() {
        let mut mock = MockVectorRepository::new();
        mock.expect_delete()
            .with(eq("docs"), eq(vec![PointId::Num(5), PointId::from("x")]))
            .returning(|_, _| {
                Ok(UpdateOutcome {
                    operation_id: Some(3),
                    status: UpdateStatus::Acknowledged,
                })
            });

        let envelope = router(mock)
            .call(
                "delete_vectors",
                &json!({ "collection": "docs", "ids": ["5", "x"] }),
            )
            .await;
        assert_eq!(
            envelope.data.unwrap(),
            json!({
                "message": "Deleted 2 vectors from collection 'docs'",
                "count": 2,
                "operation_id": 3,
                "status_info": "acknowledged"
            })
        );
    }

    #[tokio::test]
    async fn test_get_vectors_omits_missing() {
        let mut mock = MockVectorRepository::new();
        mock.expect_retrieve()
            .returning(|_, _| Ok(vec![Point::new(PointId::Num(1), vec![0.5, 0.25])]));

        let envelope = router(mock)
            .call("get_vectors", &json!({ "collection": "docs", "ids": [1, 2] }))
            .await;
        assert_eq!(
            envelope.data.unwrap(),
            json!({
                "count": 1,
                "vectors": [{ "id": 1, "vector": [0.5, 0.25], "payload": {} }]
            })
        );
    }

    #[tokio::test]
    async fn test_health_check_healthy() {
        let mut mock = MockVectorRepository::new();
        mock.expect_list_collections()
            .returning(|| Ok(vec!["docs".to_string()]));

        let data = router(mock)
            .call("health_check", &json!({}))
            .await
            .data
            .unwrap();
        assert_eq!(data["status"], "healthy");
        assert_eq!(data["collections_count"], 1);
        assert!(data["timestamp"].is_string());
    }

    #[test]
    fn test_rank_is_stable() {
        let mut hits = vec![hit(1, 0.5), hit(2, 0.9), hit(3, 0.5)];
        rank(&mut hits, true, 10);
        let ids: Vec<_> = hits.iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec![PointId::Num(2), PointId::Num(1), PointId::Num(3)]);
    }

    #[test]
    fn test_catalogue_exposed() {
        let router = router(MockVectorRepository::new());
        assert_eq!(router.catalogue().len(), 9);
        assert_eq!(router.clone().catalogue()[0].name, "list_collections");
    }
}
