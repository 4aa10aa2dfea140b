//! Driver-neutral transport seam and raw result records.
//!
//! The adapter never sees driver types. A [`Transport`] runs one compiled
//! [`Statement`] inside its own transaction and hands back rows whose columns
//! are decoded into [`RawValue`]s: native node and relationship fragments
//! (carrying the database's own element ids), scalars, or nulls.

use std::collections::HashMap;

use async_trait::async_trait;
use graphport_core::Properties;
use graphport_core::PropertyValue;

use crate::compiler::Statement;

/// Errors from statement execution.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Transport is closed")]
    Closed,

    #[error("Statement failed: {0}")]
    Statement(String),
}

/// A node as stored, before shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    /// Database-native element id. Only meaningful within one result set.
    pub element_id: i64,
    pub labels: Vec<String>,
    pub properties: Properties,
}

/// A relationship as stored, before shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRelationship {
    pub element_id: i64,
    pub start_id: i64,
    pub end_id: i64,
    pub rel_type: String,
    pub properties: Properties,
}

/// One decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Node(RawNode),
    Relationship(RawRelationship),
    Scalar(PropertyValue),
    Null,
    /// The driver returned a graph value that could not be decoded.
    Malformed(String),
}

/// One result row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: RawValue) {
        self.columns.insert(column.into(), value);
    }

    pub fn with(mut self, column: impl Into<String>, value: RawValue) -> Self {
        self.insert(column, value);
        self
    }

    /// Value of `column`; a column the row does not carry reads as `Null`.
    pub fn get(&self, column: &str) -> &RawValue {
        static NULL: RawValue = RawValue::Null;
        self.columns.get(column).unwrap_or(&NULL)
    }
}

/// Executes compiled statements against a graph database.
///
/// Each call is a scoped unit of work on a fresh transaction that is never
/// reused. A successful write statement commits. Read statements and failed
/// statements roll back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Vec<RawRow>, TransportError>;

    /// Release the underlying connection pool.
    async fn close(&self) -> Result<(), TransportError>;
}
