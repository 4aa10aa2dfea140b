//! The graph-storage port implemented by every adapter.

use async_trait::async_trait;

use crate::error::Result;
use crate::ids;
use crate::types::{Graph, Link, LinkDelta, Node, NodeDelta};

/// Default result columns scanned by `query_graph`.
pub const DEFAULT_QUERY_COLUMNS: [&str; 3] = ["n", "r", "m"];

/// A caller-supplied statement for [`GraphStore::query_graph`].
///
/// The statement bypasses the query compiler entirely. Every column named in
/// `columns` is inspected on every row; node and relationship values found
/// there become graph fragments, anything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    text: String,
    columns: Vec<String>,
}

impl RawQuery {
    /// A raw statement returning its fragments as `n`, `r`, `m`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            columns: DEFAULT_QUERY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Backend-agnostic CRUD and whole-graph access.
///
/// "Absent" results are `Ok(None)`; failures are typed
/// [`GraphPortError`](crate::error::GraphPortError)s.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Human-readable adapter name.
    fn name(&self) -> &str;

    /// Create the node, or fully replace labels and properties of an
    /// existing node with the same id.
    async fn set_node(&self, node: &Node) -> Result<Node>;

    async fn read_node(&self, id: &str) -> Result<Option<Node>>;

    /// Union labels and merge properties into an existing node.
    /// Returns `None` if the node does not exist.
    async fn patch_node(&self, id: &str, delta: &NodeDelta) -> Result<Option<Node>>;

    /// Delete the node and every incident link. Returns the pre-deletion
    /// snapshot, or `None` if the node did not exist.
    async fn delete_node(&self, id: &str) -> Result<Option<Node>>;

    /// Create or replace a link. Returns `None` if either endpoint is missing.
    async fn set_link(&self, link: &Link) -> Result<Option<Link>>;

    async fn read_link(&self, id: &str) -> Result<Option<Link>>;

    /// Merge properties into a link, or recreate it under a new label.
    /// Fails with `NotFound` if the link does not exist.
    async fn patch_link(&self, id: &str, delta: &LinkDelta) -> Result<Link>;

    /// Delete only the link. Returns the pre-deletion snapshot.
    async fn delete_link(&self, id: &str) -> Result<Option<Link>>;

    /// Snapshot of every node and link.
    async fn read_graph(&self) -> Result<Graph>;

    /// Snapshot built from a caller-supplied statement, or the full graph
    /// when `query` is `None`.
    async fn query_graph(&self, query: Option<&RawQuery>) -> Result<Graph>;

    /// Delete every node and link.
    async fn clear_graph(&self) -> Result<()>;

    async fn check_node_exists(&self, id: &str) -> Result<bool>;

    async fn check_link_exists(&self, id: &str) -> Result<bool>;

    /// A fresh node id not present in the store at generation time.
    async fn generate_node_id(&self) -> Result<String> {
        loop {
            let id = ids::node_id_candidate();
            if !self.check_node_exists(&id).await? {
                return Ok(id);
            }
            tracing::warn!(id = %id, "Generated node id already in use, re-rolling");
        }
    }

    /// A fresh link id not present in the store at generation time.
    async fn generate_link_id(&self) -> Result<String> {
        loop {
            let id = ids::link_id_candidate();
            if !self.check_link_exists(&id).await? {
                return Ok(id);
            }
            tracing::warn!(id = %id, "Generated link id already in use, re-rolling");
        }
    }

    /// Permanently close the store. Later calls fail with `ConnectionClosed`.
    async fn close(&self) -> Result<()>;
}
