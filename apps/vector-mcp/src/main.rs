//! Qdrant MCP Server - Entry Point
//!
//! Minimal entry point that delegates to the server module.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    vector_mcp_server::run().await
}
