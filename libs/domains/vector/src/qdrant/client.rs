use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, GetPointsBuilder,
    PointId as QdrantPointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::debug;

use super::QdrantConfig;
use crate::conversions::{
    distance_from_qdrant, payload_from_qdrant, payload_to_qdrant, point_id_from_qdrant,
};
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionInfo, CollectionStatus, CreateCollection, DistanceMetric, Point, PointId,
    ScoredPoint, SearchQuery, UpdateOutcome, UpdateStatus,
};
use crate::repository::VectorRepository;

/// Qdrant-backed implementation of VectorRepository
///
/// The underlying gRPC client is cheap to share; one repository serves every
/// concurrent call for the lifetime of the process.
pub struct QdrantRepository {
    client: Qdrant,
}

impl QdrantRepository {
    pub fn new(config: QdrantConfig) -> VectorResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| VectorError::Qdrant(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    fn to_point_ids(ids: Vec<PointId>) -> Vec<QdrantPointId> {
        ids.into_iter().map(QdrantPointId::from).collect()
    }

    fn to_update_outcome(result: Option<qdrant::UpdateResult>) -> UpdateOutcome {
        match result {
            Some(result) => UpdateOutcome {
                operation_id: result.operation_id,
                status: match result.status() {
                    qdrant::UpdateStatus::Acknowledged => UpdateStatus::Acknowledged,
                    qdrant::UpdateStatus::Completed => UpdateStatus::Completed,
                    qdrant::UpdateStatus::ClockRejected => UpdateStatus::ClockRejected,
                    _ => UpdateStatus::Unknown,
                },
            },
            None => UpdateOutcome {
                operation_id: None,
                status: UpdateStatus::Unknown,
            },
        }
    }

    /// Extract dense vector values from VectorsOutput
    /// Note: Uses deprecated data field for now until migration to 1.18+
    #[allow(deprecated)]
    fn extract_vector_from_output(vectors: Option<qdrant::VectorsOutput>) -> Vec<f32> {
        match vectors.and_then(|v| v.vectors_options) {
            Some(qdrant::vectors_output::VectorsOptions::Vector(v)) => v.data,
            // Named vectors: return the first one
            Some(qdrant::vectors_output::VectorsOptions::Vectors(map)) => map
                .vectors
                .into_values()
                .next()
                .map(|v| v.data)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn extract_config_params(config: Option<&qdrant::CollectionConfig>) -> (u64, DistanceMetric) {
        let vectors_config = config
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|vc| vc.config.as_ref());

        match vectors_config {
            Some(qdrant::vectors_config::Config::Params(p)) => {
                (p.size, distance_from_qdrant(p.distance()))
            }
            // Named vectors: report the first vector's params
            Some(qdrant::vectors_config::Config::ParamsMap(map)) => map
                .map
                .values()
                .next()
                .map(|p| (p.size, distance_from_qdrant(p.distance())))
                .unwrap_or((0, DistanceMetric::Cosine)),
            None => (0, DistanceMetric::Cosine),
        }
    }

    fn to_collection_status(status: qdrant::CollectionStatus) -> CollectionStatus {
        match status {
            qdrant::CollectionStatus::Green => CollectionStatus::Green,
            qdrant::CollectionStatus::Yellow => CollectionStatus::Yellow,
            qdrant::CollectionStatus::Red => CollectionStatus::Red,
            _ => CollectionStatus::Grey,
        }
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self.client.list_collections().await?;
        Ok(response
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.client.collection_exists(name).await?)
    }

    async fn create_collection(&self, input: CreateCollection) -> VectorResult<()> {
        let builder = CreateCollectionBuilder::new(&input.name).vectors_config(
            VectorParamsBuilder::new(input.vector_size, Distance::from(input.distance)),
        );

        self.client.create_collection(builder).await?;
        debug!(collection = %input.name, size = input.vector_size, "Collection created");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        let response = self.client.delete_collection(name).await?;
        if !response.result {
            return Err(VectorError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> VectorResult<CollectionInfo> {
        let response = match self.client.collection_info(name).await {
            Ok(response) => response,
            Err(err) => {
                // Qdrant reports a missing collection as a generic status error
                return match self.client.collection_exists(name).await {
                    Ok(false) => Err(VectorError::CollectionNotFound(name.to_string())),
                    _ => Err(err.into()),
                };
            }
        };

        let result = response
            .result
            .ok_or_else(|| VectorError::Internal("Collection info missing result".to_string()))?;

        let (vector_size, distance) = Self::extract_config_params(result.config.as_ref());

        Ok(CollectionInfo {
            name: name.to_string(),
            status: Self::to_collection_status(result.status()),
            points_count: result.points_count.unwrap_or_default(),
            // The gRPC collection info no longer carries a vector count
            vectors_count: None,
            indexed_vectors_count: result.indexed_vectors_count.unwrap_or_default(),
            segments_count: result.segments_count,
            vector_size,
            distance,
        })
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<UpdateOutcome> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                PointStruct::new(
                    QdrantPointId::from(point.id),
                    point.vector,
                    payload_to_qdrant(point.payload),
                )
            })
            .collect();

        let builder = UpsertPointsBuilder::new(collection, points).wait(true);
        let response = self.client.upsert_points(builder).await?;

        Ok(Self::to_update_outcome(response.result))
    }

    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection, query.vector, query.limit)
            .with_payload(true)
            .with_vectors(false);

        if let Some(threshold) = query.score_threshold {
            builder = builder.score_threshold(threshold);
        }

        if let Some(filter) = query.filter.filter(|f| !f.is_empty()) {
            builder = builder.filter(Filter::try_from(filter)?);
        }

        let response = self.client.search_points(builder).await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(ScoredPoint {
                    id: point_id_from_qdrant(point.id)?,
                    score: point.score,
                    payload: payload_from_qdrant(point.payload),
                })
            })
            .collect()
    }

    async fn retrieve(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<Vec<Point>> {
        let builder = GetPointsBuilder::new(collection, Self::to_point_ids(ids))
            .with_vectors(true)
            .with_payload(true);

        let response = self.client.get_points(builder).await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(Point {
                    id: point_id_from_qdrant(point.id)?,
                    vector: Self::extract_vector_from_output(point.vectors),
                    payload: payload_from_qdrant(point.payload),
                })
            })
            .collect()
    }

    async fn delete(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<UpdateOutcome> {
        let builder = DeletePointsBuilder::new(collection)
            .points(Self::to_point_ids(ids))
            .wait(true);

        let response = self.client.delete_points(builder).await?;

        Ok(Self::to_update_outcome(response.result))
    }
}
