//! Shared test utilities for the vector crates
//!
//! This crate provides reusable test infrastructure:
//! - `InMemoryVectorStore`: deterministic `VectorRepository` fake (always available)
//! - `TestQdrant`: Qdrant container with automatic cleanup (feature: "qdrant")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Features
//!
//! - `qdrant`: Enables the Qdrant testcontainer
//! - `all`: Enables all container test infrastructure
//!
//! # Usage
//!
//! ## In-memory store
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use test_utils::{InMemoryVectorStore, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_router_test() {
//!     let store = Arc::new(InMemoryVectorStore::new());
//!     let builder = TestDataBuilder::from_test_name("my_router_test");
//!
//!     let collection = builder.name("collection", "main");
//!     let vector = builder.vector(128);
//! }
//! ```
//!
//! ## Qdrant Testing
//!
//! Add `features = ["qdrant"]` to your dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["qdrant"] }
//! ```
//!
//! Then in your tests:
//!
//! ```rust,ignore
//! use test_utils::TestQdrant;
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_qdrant_test() {
//!     let qdrant = TestQdrant::new().await;
//!     let repository = qdrant.repository();
//! }
//! ```

mod memory;

#[cfg(feature = "qdrant")]
mod qdrant;

pub use memory::InMemoryVectorStore;

#[cfg(feature = "qdrant")]
pub use qdrant::TestQdrant;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_search_vectors");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique name for testing
    ///
    /// # Arguments
    ///
    /// * `prefix` - The type of resource (e.g., "collection")
    /// * `suffix` - A unique identifier within the test (e.g., "main", "backup")
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("collection", "main");
    /// // Returns: "test-collection-12345-main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Deterministic vector with components in `[-1, 1)`
    pub fn vector(&self, dimension: usize) -> Vec<f32> {
        self.vector_with_offset(dimension, 0)
    }

    /// Like [`vector`](Self::vector), but distinct for each `offset`
    pub fn vector_with_offset(&self, dimension: usize, offset: u64) -> Vec<f32> {
        // splitmix64 keeps the sequence stable across platforms
        let mut state = self.seed.wrapping_add(offset.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        (0..dimension)
            .map(|_| {
                state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
                let mut z = state;
                z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
                z ^= z >> 31;
                ((z >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert that `results[*].score` never increases
    pub fn assert_scores_descending(results: &[Value], context: &str) {
        let scores: Vec<f64> = results
            .iter()
            .map(|r| {
                r["score"]
                    .as_f64()
                    .unwrap_or_else(|| panic!("{}: result without numeric score: {}", context, r))
            })
            .collect();

        for pair in scores.windows(2) {
            assert!(
                pair[0] >= pair[1],
                "{}: scores not in descending order: {:?}",
                context,
                scores
            );
        }
    }

    /// Assert that an envelope is a success and return its data
    pub fn assert_success(envelope: &Value, context: &str) -> Value {
        assert_eq!(
            envelope["status"], "success",
            "{}: expected success envelope, got {}",
            context, envelope
        );
        envelope["data"].clone()
    }

    /// Assert that an envelope is an error whose message contains `needle`
    pub fn assert_error_contains(envelope: &Value, needle: &str, context: &str) {
        assert_eq!(
            envelope["status"], "error",
            "{}: expected error envelope, got {}",
            context, envelope
        );
        let message = envelope["message"].as_str().unwrap_or_default();
        assert!(
            message.contains(needle),
            "{}: expected message containing {:?}, got {:?}",
            context,
            needle,
            message
        );
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
