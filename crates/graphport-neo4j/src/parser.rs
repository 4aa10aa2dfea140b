//! Result parser: validate raw fragments and turn them into domain values.
//!
//! A `Null` column is a legitimately absent entity and parses to `None`.
//! Anything that is present but does not have the expected shape is a
//! `Parse` error; the two are never conflated.

use std::collections::HashMap;

use graphport_core::{EntityKind, GraphPortError, Link, Node, PropertyValue, Result, IDENTITY_KEY};

use crate::transport::{RawNode, RawRelationship, RawRow, RawValue};

/// Decode a node fragment.
pub fn decode_node(raw: &RawNode) -> Result<Node> {
    if let Some(pos) = raw.labels.iter().position(|l| l.is_empty()) {
        return Err(GraphPortError::parse(
            EntityKind::Node,
            format!("label {pos} is empty"),
        ));
    }
    let mut properties = raw.properties.clone();
    let id = take_identity(&mut properties, EntityKind::Node)?;
    Node::new(id, raw.labels.iter().cloned(), properties)
        .map_err(|e| GraphPortError::parse(EntityKind::Node, e.to_string()))
}

/// Decode a relationship fragment whose endpoints are already resolved to
/// domain ids.
pub fn decode_link(raw: &RawRelationship, source: &str, target: &str) -> Result<Link> {
    if raw.rel_type.is_empty() {
        return Err(GraphPortError::parse(
            EntityKind::Link,
            "relationship type is empty",
        ));
    }
    let mut properties = raw.properties.clone();
    let id = take_identity(&mut properties, EntityKind::Link)?;
    Link::new(id, raw.rel_type.clone(), properties, source, target)
        .map_err(|e| GraphPortError::parse(EntityKind::Link, e.to_string()))
}

fn take_identity(
    properties: &mut graphport_core::Properties,
    entity: EntityKind,
) -> Result<String> {
    match properties.remove(IDENTITY_KEY) {
        Some(PropertyValue::String(id)) => Ok(id),
        Some(other) => Err(GraphPortError::parse(
            entity,
            format!("identity property {IDENTITY_KEY} is not a string: {other:?}"),
        )),
        None => Err(GraphPortError::parse(
            entity,
            format!("identity property {IDENTITY_KEY} is missing"),
        )),
    }
}

/// Parse the node in `column`, or `None` if the column is null.
pub fn node_column(row: &RawRow, column: &str) -> Result<Option<Node>> {
    match row.get(column) {
        RawValue::Null => Ok(None),
        RawValue::Node(raw) => decode_node(raw).map(Some),
        other => Err(unexpected(EntityKind::Node, column, other)),
    }
}

/// Parse a `(source)-[link]->(target)` triple from one row.
///
/// The relationship's endpoints are matched to the row's node fragments by
/// native element id. Returns `None` if any of the three columns is null.
pub fn link_triple(row: &RawRow, source_col: &str, link_col: &str, target_col: &str) -> Result<Option<Link>> {
    let raw_link = match row.get(link_col) {
        RawValue::Null => return Ok(None),
        RawValue::Relationship(rel) => rel,
        other => return Err(unexpected(EntityKind::Link, link_col, other)),
    };
    let (raw_source, raw_target) = match (row.get(source_col), row.get(target_col)) {
        (RawValue::Node(a), RawValue::Node(b)) => (a, b),
        (RawValue::Null, _) | (_, RawValue::Null) => return Ok(None),
        (RawValue::Node(_), other) => return Err(unexpected(EntityKind::Node, target_col, other)),
        (other, _) => return Err(unexpected(EntityKind::Node, source_col, other)),
    };

    if raw_link.start_id != raw_source.element_id || raw_link.end_id != raw_target.element_id {
        return Err(GraphPortError::parse(
            EntityKind::Link,
            format!(
                "relationship {} runs {} -> {}, but row endpoints are {} -> {}",
                raw_link.element_id,
                raw_link.start_id,
                raw_link.end_id,
                raw_source.element_id,
                raw_target.element_id
            ),
        ));
    }

    let source = decode_node(raw_source)?;
    let target = decode_node(raw_target)?;
    decode_link(raw_link, source.id(), target.id()).map(Some)
}

/// Read a boolean scalar column.
pub fn flag_column(row: &RawRow, column: &str, entity: EntityKind) -> Result<bool> {
    match row.get(column) {
        RawValue::Scalar(PropertyValue::Boolean(b)) => Ok(*b),
        other => Err(unexpected(entity, column, other)),
    }
}

/// Read an integer scalar column.
pub fn count_column(row: &RawRow, column: &str, entity: EntityKind) -> Result<i64> {
    match row.get(column) {
        RawValue::Scalar(PropertyValue::Integer(n)) => Ok(*n),
        other => Err(unexpected(entity, column, other)),
    }
}

/// Fragments collected from a whole-graph scan.
#[derive(Debug, Default)]
pub struct ScanFragments {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Relationships whose endpoints never appeared as node fragments.
    pub unresolved: usize,
}

/// Collect node and link fragments from every inspected column of every row.
///
/// Relationship endpoints are resolved by native element id, first among the
/// row's own node fragments and then among all fragments of the result, so
/// that a node repeated across many rows is decoded consistently.
pub fn scan(rows: &[RawRow], columns: &[String]) -> Result<ScanFragments> {
    let mut fragments = ScanFragments::default();
    let mut native_ids: HashMap<i64, String> = HashMap::new();
    let mut pending: Vec<(&RawRelationship, Option<String>, Option<String>)> = Vec::new();

    for row in rows {
        let mut row_local: HashMap<i64, String> = HashMap::new();
        let mut row_rels = Vec::new();

        for column in columns {
            match row.get(column) {
                RawValue::Node(raw) => {
                    let node = decode_node(raw)?;
                    row_local.insert(raw.element_id, node.id().to_string());
                    native_ids
                        .entry(raw.element_id)
                        .or_insert_with(|| node.id().to_string());
                    fragments.nodes.push(node);
                }
                RawValue::Relationship(rel) => row_rels.push(rel),
                RawValue::Malformed(reason) => {
                    return Err(GraphPortError::parse(
                        EntityKind::Graph,
                        format!("column {column}: {reason}"),
                    ));
                }
                RawValue::Scalar(_) | RawValue::Null => {}
            }
        }

        for rel in row_rels {
            pending.push((
                rel,
                row_local.get(&rel.start_id).cloned(),
                row_local.get(&rel.end_id).cloned(),
            ));
        }
    }

    for (rel, source, target) in pending {
        let source = source.or_else(|| native_ids.get(&rel.start_id).cloned());
        let target = target.or_else(|| native_ids.get(&rel.end_id).cloned());
        match (source, target) {
            (Some(source), Some(target)) => {
                fragments.links.push(decode_link(rel, &source, &target)?);
            }
            _ => {
                tracing::warn!(
                    element_id = rel.element_id,
                    start_id = rel.start_id,
                    end_id = rel.end_id,
                    "Relationship endpoint not present in result, skipping"
                );
                fragments.unresolved += 1;
            }
        }
    }

    Ok(fragments)
}

fn unexpected(entity: EntityKind, column: &str, value: &RawValue) -> GraphPortError {
    let found = match value {
        RawValue::Node(_) => "a node".to_string(),
        RawValue::Relationship(_) => "a relationship".to_string(),
        RawValue::Scalar(v) => format!("scalar {v:?}"),
        RawValue::Null => "null".to_string(),
        RawValue::Malformed(reason) => format!("malformed value ({reason})"),
    };
    GraphPortError::parse(entity, format!("column {column} holds {found}"))
}
