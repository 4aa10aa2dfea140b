//! Domain values exchanged through the graph-storage port.
//!
//! `Node`, `Link` and `Graph` are immutable snapshots. Nodes and links are
//! built through fallible factories so that every value in circulation has
//! already passed the port's input constraints.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::EntityKind;
use crate::validate::{self, ValidationError};

// ── Property Values ───────────────────────────────────────────────

/// A schema-less property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

/// Property bag of a node or link. Key order carries no meaning.
pub type Properties = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

// ── Node ──────────────────────────────────────────────────────────

/// A node snapshot: identity, label set, and properties.
///
/// `properties` never contains the reserved identity key; the id is exposed
/// through [`Node::id`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeFields")]
pub struct Node {
    id: String,
    labels: Vec<String>,
    properties: Properties,
}

#[derive(Deserialize)]
struct NodeFields {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Properties,
}

impl TryFrom<NodeFields> for Node {
    type Error = ValidationError;

    fn try_from(fields: NodeFields) -> Result<Self, Self::Error> {
        Node::new(fields.id, fields.labels, fields.properties)
    }
}

impl Node {
    /// Build a node, checking id, labels and properties.
    pub fn new<I, L>(id: impl Into<String>, labels: I, properties: Properties) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let id = id.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        validate::validate_id(EntityKind::Node, &id)?;
        validate::validate_node_labels(&labels)?;
        validate::validate_properties(&properties)?;
        Ok(Self {
            id,
            labels,
            properties,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

// ── Link ──────────────────────────────────────────────────────────

/// A directed, typed link between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinkFields")]
pub struct Link {
    id: String,
    label: String,
    properties: Properties,
    source: String,
    target: String,
}

#[derive(Deserialize)]
struct LinkFields {
    id: String,
    label: String,
    #[serde(default)]
    properties: Properties,
    source: String,
    target: String,
}

impl TryFrom<LinkFields> for Link {
    type Error = ValidationError;

    fn try_from(fields: LinkFields) -> Result<Self, Self::Error> {
        Link::new(
            fields.id,
            fields.label,
            fields.properties,
            fields.source,
            fields.target,
        )
    }
}

impl Link {
    /// Build a link, checking id, label, properties and endpoint ids.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        properties: Properties,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let label = label.into();
        let source = source.into();
        let target = target.into();
        validate::validate_id(EntityKind::Link, &id)?;
        validate::validate_link_label(&label)?;
        validate::validate_properties(&properties)?;
        validate::validate_id(EntityKind::Node, &source)?;
        validate::validate_id(EntityKind::Node, &target)?;
        Ok(Self {
            id,
            label,
            properties,
            source,
            target,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

// ── Deltas ────────────────────────────────────────────────────────

/// Partial update for a node. Labels are unioned, properties merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDelta {
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl NodeDelta {
    pub fn labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            labels: Some(labels.into_iter().map(Into::into).collect()),
            properties: None,
        }
    }

    pub fn properties(properties: Properties) -> Self {
        Self {
            labels: None,
            properties: Some(properties),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(labels) = &self.labels {
            validate::validate_node_labels(labels)?;
        }
        if let Some(properties) = &self.properties {
            validate::validate_properties(properties)?;
        }
        Ok(())
    }
}

/// Partial update for a link. A new label replaces the relationship type;
/// properties are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkDelta {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl LinkDelta {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            properties: None,
        }
    }

    pub fn properties(properties: Properties) -> Self {
        Self {
            label: None,
            properties: Some(properties),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(label) = &self.label {
            validate::validate_link_label(label)?;
        }
        if let Some(properties) = &self.properties {
            validate::validate_properties(properties)?;
        }
        Ok(())
    }
}

// ── Graph ─────────────────────────────────────────────────────────

/// A consistent snapshot of nodes and the links between them.
///
/// Every link's source and target are present in the node set. Built by
/// [`GraphAssembler`](crate::assembly::GraphAssembler) only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Graph {
    pub(crate) fn from_parts(nodes: Vec<Node>, links: Vec<Link>, index: HashMap<String, usize>) -> Self {
        Self {
            nodes,
            links,
            index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Resolve a link's endpoints to the node objects of this graph.
    pub fn endpoints(&self, link: &Link) -> Option<(&Node, &Node)> {
        Some((self.node(&link.source)?, self.node(&link.target)?))
    }

    /// Iterate links together with their resolved source and target nodes.
    pub fn resolved_links(&self) -> impl Iterator<Item = (&Link, &Node, &Node)> + '_ {
        self.links
            .iter()
            .filter_map(|l| self.endpoints(l).map(|(s, t)| (l, s, t)))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
