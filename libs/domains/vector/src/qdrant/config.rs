use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

/// Default gRPC endpoint of a local Qdrant
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Qdrant connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            api_key: None,
            timeout_secs: 30,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for QdrantConfig {
    /// Reads from environment variables:
    /// - QDRANT_URL: defaults to http://localhost:6334
    /// - QDRANT_API_KEY: optional, empty means unset
    /// - QDRANT_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_or_default("QDRANT_URL", DEFAULT_QDRANT_URL);

        let api_key = env_optional("QDRANT_API_KEY");
        let timeout_secs = env_parse("QDRANT_TIMEOUT_SECS", 30)?;

        Ok(Self {
            url,
            api_key,
            timeout_secs,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QDRANT_URL.to_string())
    }
}
