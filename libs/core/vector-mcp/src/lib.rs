//! Vector MCP Server
//!
//! An MCP (Model Context Protocol) tool server over a Qdrant vector store.
//!
//! - [`catalogue`]: the fixed set of operations and their input schemas
//! - [`Operation`]: validated, typed requests built from raw tool arguments
//! - [`OperationRouter`]: runs an operation against an injected
//!   [`VectorRepository`](domain_vector::VectorRepository) and wraps the
//!   outcome in an [`Envelope`]
//! - [`McpHandler`]: JSON-RPC `initialize` / `tools/list` / `tools/call`
//! - [`transport`]: newline-delimited JSON-RPC over any async reader/writer
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_vector::{QdrantConfig, QdrantRepository};
//! use vector_mcp::{McpHandler, OperationRouter, transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(QdrantRepository::new(QdrantConfig::default())?);
//! let handler = McpHandler::new(OperationRouter::new(store));
//! transport::serve_stdio(&handler).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalogue;
mod envelope;
mod error;
mod mcp;
mod request;
mod router;
pub mod transport;

pub use catalogue::{OperationDescriptor, ParamSpec, ParamType};
pub use envelope::{Envelope, Status};
pub use error::{Error, ErrorContext, Result};
pub use mcp::{McpError, McpHandler, McpRequest, McpResponse};
pub use request::{
    CollectionNameArgs, CreateCollectionArgs, Operation, PointIdsArgs, SearchVectorsArgs,
    UpsertVectorsArgs,
};
pub use router::OperationRouter;
