//! `GraphStore` implementation for Neo4j.
//!
//! The adapter owns no graph state. Each operation validates its input,
//! compiles one or more statements, runs each on a fresh transaction through
//! the [`Transport`], and parses the rows back into domain values.
//!
//! `set_node` and `set_link` read before they write to decide between create
//! and replace. The read and the write are separate transactions, so two
//! writers racing on the same id resolve as last-writer-wins.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use graphport_core::assembly::assemble;
use graphport_core::error::BoxError;
use graphport_core::validate::validate_id;
use graphport_core::{
    EndpointPolicy, EntityKind, Graph, GraphPortError, GraphStore, Link, LinkDelta, Node, NodeDelta,
    RawQuery, Result,
};

use crate::client::{GraphConfig, Neo4jTransport};
use crate::compiler::{self, AccessMode, Statement};
use crate::parser;
use crate::transport::{RawRow, Transport, TransportError};

pub const ADAPTER_NAME: &str = "Neo4j";

/// Neo4j-backed graph store. Cheap to share behind an `Arc`.
pub struct Neo4jAdapter<T = Neo4jTransport> {
    transport: T,
    closed: AtomicBool,
}

impl Neo4jAdapter<Neo4jTransport> {
    /// Connect to Neo4j and open the adapter.
    pub async fn connect(config: &GraphConfig) -> std::result::Result<Self, TransportError> {
        let transport = Neo4jTransport::connect(config).await?;
        Ok(Self::with_transport(transport))
    }
}

impl<T: Transport> Neo4jAdapter<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            closed: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run one statement, mapping driver failures to read/write errors by the
    /// statement's access mode.
    async fn run(&self, operation: &'static str, id: Option<&str>, statement: &Statement) -> Result<Vec<RawRow>> {
        if self.is_closed() {
            return Err(GraphPortError::ConnectionClosed { operation });
        }
        tracing::debug!(operation, statement = %statement, "Executing statement");

        self.transport.execute(statement).await.map_err(|e| {
            tracing::error!(
                operation,
                id = id.unwrap_or_default(),
                mode = ?statement.mode,
                statement = %statement.text,
                error = %e,
                "Statement failed"
            );
            let id = id.map(str::to_string);
            let source: BoxError = Box::new(e);
            match statement.mode {
                AccessMode::Read => GraphPortError::Read { operation, id, source },
                AccessMode::Write => GraphPortError::Write { operation, id, source },
            }
        })
    }

    /// Parse the node in column `n` of the first row, if any.
    fn first_node(rows: &[RawRow]) -> Result<Option<Node>> {
        match rows.first() {
            Some(row) => parser::node_column(row, "n").map_err(log_parse_failure),
            None => Ok(None),
        }
    }

    /// Parse the `a`, `r`, `b` triple of the first row, if any.
    fn first_link(rows: &[RawRow]) -> Result<Option<Link>> {
        match rows.first() {
            Some(row) => parser::link_triple(row, "a", "r", "b").map_err(log_parse_failure),
            None => Ok(None),
        }
    }

    fn first_count(rows: &[RawRow], entity: EntityKind) -> Result<i64> {
        match rows.first() {
            Some(row) => parser::count_column(row, "deleted", entity).map_err(log_parse_failure),
            None => Ok(0),
        }
    }

    async fn exists(&self, operation: &'static str, id: &str, statement: Statement, entity: EntityKind) -> Result<bool> {
        validate_id(entity, id)?;
        let rows = self.run(operation, Some(id), &statement).await?;
        match rows.first() {
            Some(row) => parser::flag_column(row, "found", entity).map_err(log_parse_failure),
            None => Ok(false),
        }
    }
}

fn log_parse_failure(err: GraphPortError) -> GraphPortError {
    tracing::error!(error = %err, "Result did not match the expected shape");
    err
}

#[async_trait]
impl<T: Transport> GraphStore for Neo4jAdapter<T> {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    // ── Nodes ────────────────────────────────────────────────────

    async fn set_node(&self, node: &Node) -> Result<Node> {
        let statement = if self.check_node_exists(node.id()).await? {
            tracing::debug!(id = %node.id(), "Replacing existing node");
            compiler::replace_node(node)
        } else {
            tracing::debug!(id = %node.id(), "Creating new node");
            compiler::create_node(node)
        };

        let rows = self.run("set node", Some(node.id()), &statement).await?;
        Self::first_node(&rows)?.ok_or_else(|| GraphPortError::NotFound {
            entity: EntityKind::Node,
            id: node.id().to_string(),
        })
    }

    async fn read_node(&self, id: &str) -> Result<Option<Node>> {
        validate_id(EntityKind::Node, id)?;
        let rows = self.run("read node", Some(id), &compiler::read_node(id)).await?;
        Self::first_node(&rows)
    }

    async fn patch_node(&self, id: &str, delta: &NodeDelta) -> Result<Option<Node>> {
        delta.validate()?;
        if !self.check_node_exists(id).await? {
            tracing::debug!(id, "Patch target node does not exist");
            return Ok(None);
        }
        let rows = self.run("patch node", Some(id), &compiler::patch_node(id, delta)).await?;
        Self::first_node(&rows)
    }

    async fn delete_node(&self, id: &str) -> Result<Option<Node>> {
        let Some(before) = self.read_node(id).await? else {
            return Ok(None);
        };
        let rows = self.run("delete node", Some(id), &compiler::delete_node(id)).await?;
        if Self::first_count(&rows, EntityKind::Node)? == 0 {
            // Deleted by someone else between the read and the delete.
            return Ok(None);
        }
        Ok(Some(before))
    }

    // ── Links ────────────────────────────────────────────────────

    async fn set_link(&self, link: &Link) -> Result<Option<Link>> {
        let Some(source) = self.read_node(link.source()).await? else {
            tracing::debug!(id = %link.id(), source = %link.source(), "Link source does not exist");
            return Ok(None);
        };
        let Some(target) = self.read_node(link.target()).await? else {
            tracing::debug!(id = %link.id(), target = %link.target(), "Link target does not exist");
            return Ok(None);
        };

        // An existing link keeps its own endpoints; only label and properties change.
        let statement = if self.check_link_exists(link.id()).await? {
            tracing::debug!(id = %link.id(), "Replacing existing link");
            compiler::replace_link(link)
        } else {
            tracing::debug!(id = %link.id(), "Creating new link");
            compiler::create_link(link, &source, &target)
        };

        let rows = self.run("set link", Some(link.id()), &statement).await?;
        Self::first_link(&rows)
    }

    async fn read_link(&self, id: &str) -> Result<Option<Link>> {
        validate_id(EntityKind::Link, id)?;
        let rows = self.run("read link", Some(id), &compiler::read_link(id)).await?;
        Self::first_link(&rows)
    }

    async fn patch_link(&self, id: &str, delta: &LinkDelta) -> Result<Link> {
        validate_id(EntityKind::Link, id)?;
        delta.validate()?;
        let rows = self.run("patch link", Some(id), &compiler::patch_link(id, delta)).await?;
        Self::first_link(&rows)?.ok_or_else(|| GraphPortError::NotFound {
            entity: EntityKind::Link,
            id: id.to_string(),
        })
    }

    async fn delete_link(&self, id: &str) -> Result<Option<Link>> {
        let Some(before) = self.read_link(id).await? else {
            return Ok(None);
        };
        let rows = self.run("delete link", Some(id), &compiler::delete_link(id)).await?;
        if Self::first_count(&rows, EntityKind::Link)? == 0 {
            return Ok(None);
        }
        Ok(Some(before))
    }

    // ── Whole Graph ──────────────────────────────────────────────

    async fn read_graph(&self) -> Result<Graph> {
        self.query_graph(None).await
    }

    async fn query_graph(&self, query: Option<&RawQuery>) -> Result<Graph> {
        let statement = match query {
            Some(q) => compiler::raw_query(q),
            None => compiler::read_graph(),
        };
        let rows = self.run("query graph", None, &statement).await?;
        let fragments = parser::scan(&rows, &statement.columns).map_err(log_parse_failure)?;
        if fragments.unresolved > 0 {
            tracing::warn!(skipped = fragments.unresolved, "Links skipped during graph scan");
        }

        let graph = assemble(fragments.nodes, fragments.links, EndpointPolicy::Drop)?;
        tracing::debug!(
            nodes = graph.nodes().len(),
            links = graph.links().len(),
            "Graph assembled"
        );
        Ok(graph)
    }

    async fn clear_graph(&self) -> Result<()> {
        self.run("clear graph", None, &compiler::clear_graph()).await?;
        tracing::info!("Graph cleared");
        Ok(())
    }

    // ── Existence ────────────────────────────────────────────────

    async fn check_node_exists(&self, id: &str) -> Result<bool> {
        self.exists("check node exists", id, compiler::node_exists(id), EntityKind::Node)
            .await
    }

    async fn check_link_exists(&self, id: &str) -> Result<bool> {
        self.exists("check link exists", id, compiler::link_exists(id), EntityKind::Link)
            .await
    }

    // ── Lifecycle ────────────────────────────────────────────────

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.transport.close().await {
            tracing::warn!(error = %e, "Transport did not close cleanly");
        }
        tracing::info!(adapter = ADAPTER_NAME, "Graph store closed");
        Ok(())
    }
}
