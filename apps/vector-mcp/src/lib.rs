//! Qdrant MCP Server
//!
//! Exposes a Qdrant vector database to AI assistants as MCP tools over stdio.
//!
//! ## Architecture
//!
//! ```text
//! MCP client (assistant)
//!   ↓ (JSON-RPC, one message per line on stdin/stdout)
//! McpHandler (vector-mcp)
//!   ↓ (tools/call → named operation)
//! OperationRouter
//!   ↓ (validated, typed requests)
//! QdrantRepository (domain_vector)
//!   ↓ (gRPC)
//! Qdrant
//! ```
//!
//! ## Modules
//!
//! - `server`: startup and lifecycle

pub mod server;

pub use server::run;
