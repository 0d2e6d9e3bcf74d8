//! Server initialization and lifecycle management
//!
//! This module handles all server setup:
//! - Error report and tracing initialization
//! - Qdrant client construction
//! - Router and MCP handler wiring
//! - Serving stdio until the client closes the stream

use std::sync::Arc;

use core_config::{Environment, FromEnv};
use domain_vector::{QdrantConfig, QdrantRepository};
use eyre::{Result, WrapErr};
use tracing::info;
use vector_mcp::{McpHandler, OperationRouter, transport};

/// Run the MCP server
///
/// 1. Installs color-eyre and structured logging (JSON for prod, pretty for dev; always stderr)
/// 2. Builds the Qdrant client from `QDRANT_*` variables
/// 3. Serves MCP over stdin/stdout until EOF
///
/// The client connects lazily, so an unreachable Qdrant does not stop
/// startup; it surfaces through `health_check` and per-call errors.
///
/// # Errors
///
/// Returns an error if:
/// - Qdrant configuration is invalid
/// - The Qdrant client cannot be built
/// - Reading stdin or writing stdout fails
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();

    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let qdrant_config = QdrantConfig::from_env().wrap_err("Failed to load Qdrant configuration")?;

    info!(
        url = %qdrant_config.url,
        timeout_secs = qdrant_config.timeout_secs,
        api_key = qdrant_config.api_key.is_some(),
        "Creating Qdrant client"
    );
    let repository =
        QdrantRepository::new(qdrant_config).wrap_err("Failed to create Qdrant client")?;

    let router = OperationRouter::new(Arc::new(repository));
    let handler = McpHandler::new(router);

    info!(
        tools = vector_mcp::catalogue::CATALOGUE.len(),
        "Qdrant MCP server ready, serving on stdio"
    );
    transport::serve_stdio(&handler)
        .await
        .wrap_err("MCP transport failed")?;

    info!("Qdrant MCP server stopped");
    Ok(())
}
