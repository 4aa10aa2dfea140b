//! Neo4j connection management and the neo4rs-backed transport.

use graphport_core::{Properties, PropertyValue};
use neo4rs::{query, BoltList, BoltMap, BoltString, BoltType, ConfigBuilder, Graph, Query, Txn};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::compiler::{AccessMode, Statement};
use crate::transport::{RawNode, RawRelationship, RawRow, RawValue, Transport, TransportError};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "graphport-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

/// Thread-safe Neo4j transport over a neo4rs connection pool.
///
/// Every statement runs in its own explicit transaction. Read statements are
/// rolled back once their rows are collected, so nothing they do persists.
/// Closing drops the pool; later statements fail with [`TransportError::Closed`].
pub struct Neo4jTransport {
    graph: Mutex<Option<Graph>>,
}

impl Neo4jTransport {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, TransportError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph: Mutex::new(Some(graph)),
        })
    }

    async fn handle(&self) -> Result<Graph, TransportError> {
        // Graph is a cheap Arc clone; the lock is not held across the round trip.
        self.graph.lock().await.clone().ok_or(TransportError::Closed)
    }
}

#[async_trait::async_trait]
impl Transport for Neo4jTransport {
    async fn execute(&self, statement: &Statement) -> Result<Vec<RawRow>, TransportError> {
        let graph = self.handle().await?;
        let mut txn = graph.start_txn().await?;
        tracing::debug!(mode = ?statement.mode, "Transaction opened");

        match run_in_txn(&mut txn, statement).await {
            Ok(rows) => {
                match txn_end(statement.mode) {
                    TxnEnd::Commit => {
                        txn.commit().await?;
                        tracing::debug!(rows = rows.len(), "Transaction committed");
                    }
                    TxnEnd::Rollback => {
                        txn.rollback().await?;
                        tracing::debug!(rows = rows.len(), "Read transaction rolled back");
                    }
                }
                Ok(rows)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "Transaction rollback failed");
                } else {
                    tracing::debug!("Transaction rolled back");
                }
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.graph.lock().await.take().is_some() {
            tracing::info!("Neo4j connection pool released");
        }
        Ok(())
    }
}

/// How a transaction ends after its statement succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnEnd {
    Commit,
    Rollback,
}

fn txn_end(mode: AccessMode) -> TxnEnd {
    match mode {
        AccessMode::Read => TxnEnd::Rollback,
        AccessMode::Write => TxnEnd::Commit,
    }
}

async fn run_in_txn(txn: &mut Txn, statement: &Statement) -> Result<Vec<RawRow>, TransportError> {
    let mut stream = txn.execute(to_query(statement)).await?;
    let mut rows = Vec::new();
    while let Some(row) = stream.next(txn.handle()).await? {
        rows.push(to_raw_row(&row, &statement.columns));
    }
    Ok(rows)
}

// ── Parameter Binding ────────────────────────────────────────────

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(query(&statement.text), |q, (key, value)| {
            q.param(key, to_bolt(value))
        })
}

/// Convert a property value to its Bolt representation.
pub fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Boolean(b) => BoltType::from(*b),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Float(f) => BoltType::from(*f),
        PropertyValue::String(s) => BoltType::from(s.as_str()),
        PropertyValue::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
        PropertyValue::Map(map) => BoltType::Map(BoltMap {
            value: map
                .iter()
                .map(|(k, v)| (BoltString::from(k.as_str()), to_bolt(v)))
                .collect(),
        }),
    }
}

// ── Row Decoding ─────────────────────────────────────────────────

fn to_raw_row(row: &neo4rs::Row, columns: &[String]) -> RawRow {
    let mut raw = RawRow::new();
    for column in columns {
        raw.insert(column.clone(), column_value(row, column));
    }
    raw
}

fn column_value(row: &neo4rs::Row, column: &str) -> RawValue {
    if let Ok(node) = row.get::<neo4rs::Node>(column) {
        return raw_node(&node);
    }
    if let Ok(rel) = row.get::<neo4rs::Relation>(column) {
        return raw_relationship(&rel);
    }
    match row.get::<PropertyValue>(column) {
        Ok(value) => RawValue::Scalar(value),
        Err(_) => RawValue::Null,
    }
}

fn raw_node(node: &neo4rs::Node) -> RawValue {
    match decode_properties(node.keys(), |key| node.get::<PropertyValue>(key)) {
        Ok(properties) => RawValue::Node(RawNode {
            element_id: node.id(),
            labels: node.labels().into_iter().map(str::to_string).collect(),
            properties,
        }),
        Err(reason) => RawValue::Malformed(format!("node {}: {reason}", node.id())),
    }
}

fn raw_relationship(rel: &neo4rs::Relation) -> RawValue {
    match decode_properties(rel.keys(), |key| rel.get::<PropertyValue>(key)) {
        Ok(properties) => RawValue::Relationship(RawRelationship {
            element_id: rel.id(),
            start_id: rel.start_node_id(),
            end_id: rel.end_node_id(),
            rel_type: rel.typ().to_string(),
            properties,
        }),
        Err(reason) => RawValue::Malformed(format!("relationship {}: {reason}", rel.id())),
    }
}

fn decode_properties<'a, E: std::fmt::Display>(
    keys: Vec<&'a str>,
    get: impl Fn(&'a str) -> Result<PropertyValue, E>,
) -> Result<Properties, String> {
    keys.into_iter()
        .map(|key| {
            get(key)
                .map(|value| (key.to_string(), value))
                .map_err(|e| format!("property {key}: {e}"))
        })
        .collect()
}
