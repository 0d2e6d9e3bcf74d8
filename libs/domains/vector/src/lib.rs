//! Vector Domain Library
//!
//! Domain types and the storage seam for a Qdrant-backed vector store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ VectorRepository │  ← trait: the store collaborator seen by callers
//! │     (trait)      │
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │ QdrantRepository │  ← gRPC client (qdrant-client), payload/filter conversions
//! └──────────────────┘
//! ```
//!
//! Callers depend on [`VectorRepository`] only, so tests can swap in a fake
//! store (see `MockVectorRepository` behind the `mock` feature).
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_vector::{
//!     CreateCollection, DistanceMetric, Point, PointId, QdrantConfig, QdrantRepository,
//!     VectorRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QdrantConfig::from_env()?;
//! let repository = QdrantRepository::new(config)?;
//!
//! repository
//!     .create_collection(CreateCollection::new("documents", 384, DistanceMetric::Cosine))
//!     .await?;
//!
//! let point = Point::new(PointId::coerce("1"), vec![0.1; 384]);
//! repository.upsert("documents", vec![point]).await?;
//! # Ok(())
//! # }
//! ```

pub mod conversions;
pub mod error;
pub mod filter;
pub mod models;
pub mod qdrant;
pub mod repository;

// Re-export commonly used types
pub use error::{VectorError, VectorResult};
pub use filter::{
    Condition, FieldCondition, FieldRef, MatchCondition, MatchValue, RangeCondition, SearchFilter,
};
pub use models::{
    CollectionInfo, CollectionStatus, CreateCollection, DistanceMetric, Payload, Point, PointId,
    ScoredPoint, SearchQuery, UpdateOutcome, UpdateStatus,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
#[cfg(any(test, feature = "mock"))]
pub use repository::MockVectorRepository;
pub use repository::VectorRepository;
