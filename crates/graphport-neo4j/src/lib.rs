//! graphport-neo4j: Neo4j adapter for the graphport storage port.
//!
//! Layers, bottom to top:
//! - `client`: connection config and the neo4rs-backed [`Transport`]
//! - `compiler` / `cypher`: one parameterized Cypher [`Statement`] per operation
//! - `parser`: raw result fragments to domain values
//! - `adapter`: [`Neo4jAdapter`], the `GraphStore` implementation
//!
//! Node replacement uses `apoc.create.removeLabels`, so the APOC core plugin
//! must be installed on the server.

pub mod adapter;
pub mod client;
pub mod compiler;
pub mod cypher;
pub mod parser;
pub mod transport;

#[cfg(test)]
mod testing;

pub use adapter::Neo4jAdapter;
pub use client::{GraphConfig, Neo4jTransport};
pub use compiler::{AccessMode, Statement};
pub use transport::{RawRow, RawValue, Transport, TransportError};
