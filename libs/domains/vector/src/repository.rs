use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::{
    CollectionInfo, CreateCollection, Point, PointId, ScoredPoint, SearchQuery, UpdateOutcome,
};

/// Repository trait for vector storage operations
///
/// This trait abstracts the underlying vector database (Qdrant). Every method
/// maps to a single store call; callers do their own validation first.
/// Implementations must be safe to share across concurrent calls.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    // ===== Collection Management =====

    /// Names of all collections
    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    async fn collection_exists(&self, name: &str) -> VectorResult<bool>;

    /// Create a collection; fails if the name is taken
    async fn create_collection(&self, input: CreateCollection) -> VectorResult<()>;

    /// Delete a collection; `CollectionNotFound` if it does not exist
    async fn delete_collection(&self, name: &str) -> VectorResult<()>;

    async fn collection_info(&self, name: &str) -> VectorResult<CollectionInfo>;

    // ===== Point Operations =====

    /// Insert or replace points
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> VectorResult<UpdateOutcome>;

    /// Nearest neighbours of the query vector, best first
    async fn search(&self, collection: &str, query: SearchQuery)
    -> VectorResult<Vec<ScoredPoint>>;

    /// Fetch points with vectors and payloads. Ids that do not exist are
    /// left out of the result rather than reported.
    async fn retrieve(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<Vec<Point>>;

    async fn delete(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<UpdateOutcome>;
}
