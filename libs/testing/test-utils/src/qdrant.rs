//! Qdrant test infrastructure
//!
//! Provides a `TestQdrant` helper that starts a Qdrant container for testing.

use domain_vector::{QdrantConfig, QdrantRepository};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::qdrant::Qdrant;

/// gRPC port inside the container (6333 is REST)
const GRPC_PORT: u16 = 6334;

/// Test Qdrant wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use domain_vector::VectorRepository;
/// use test_utils::TestQdrant;
///
/// # async fn example() {
/// let qdrant = TestQdrant::new().await;
/// let repository = qdrant.repository();
/// assert!(repository.list_collections().await.unwrap().is_empty());
/// # }
/// ```
pub struct TestQdrant {
    #[allow(dead_code)]
    container: ContainerAsync<Qdrant>,
    pub url: String,
}

impl TestQdrant {
    pub async fn new() -> Self {
        let container = Qdrant::default()
            .start()
            .await
            .expect("Failed to start Qdrant container");

        let host_port = container
            .get_host_port_ipv4(GRPC_PORT)
            .await
            .expect("Failed to get Qdrant gRPC port");

        let url = format!("http://127.0.0.1:{}", host_port);
        tracing::info!(port = host_port, "Test Qdrant ready");

        Self { container, url }
    }

    pub fn config(&self) -> QdrantConfig {
        // Fresh containers can be slow to answer the first call
        QdrantConfig::new(self.url.clone()).with_timeout(10)
    }

    /// A repository connected to this container
    pub fn repository(&self) -> QdrantRepository {
        QdrantRepository::new(self.config()).expect("Failed to build Qdrant client")
    }
}

impl Drop for TestQdrant {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Qdrant container");
    }
}
