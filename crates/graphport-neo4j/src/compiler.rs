//! Cypher statement compiler.
//!
//! Every port operation compiles to exactly one [`Statement`]. Ids and
//! property bags are bound as parameters; only labels and relationship types,
//! which Cypher cannot parameterize, are spliced into the text through
//! [`cypher::labels_clause`].

use std::fmt;

use graphport_core::{Link, LinkDelta, Node, NodeDelta, Properties, PropertyValue, RawQuery, IDENTITY_KEY};

use crate::cypher;

/// Transaction access mode a statement needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// A compiled statement: Cypher text, bound parameters, and the result
/// columns the parser will inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Properties,
    pub columns: Vec<String>,
    pub mode: AccessMode,
}

impl Statement {
    pub fn read(text: impl Into<String>) -> Self {
        Self::new(text, AccessMode::Read)
    }

    pub fn write(text: impl Into<String>) -> Self {
        Self::new(text, AccessMode::Write)
    }

    fn new(text: impl Into<String>, mode: AccessMode) -> Self {
        Self {
            text: text.into(),
            params: Properties::new(),
            columns: Vec::new(),
            mode,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for Statement {
    /// Statement text followed by its parameters as a Cypher map literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.text, cypher::properties_literal(&self.params))
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// `{_id_: $param}` pattern map.
fn identity_map(param: &str) -> String {
    format!("{{{IDENTITY_KEY}: ${param}}}")
}

/// Properties as stored: the caller's bag plus the identity key.
fn stored_properties(id: &str, properties: &Properties) -> PropertyValue {
    let mut stored = properties.clone();
    stored.insert(IDENTITY_KEY.to_string(), PropertyValue::from(id));
    PropertyValue::Map(stored)
}

// ── Nodes ────────────────────────────────────────────────────────

/// Create a node that does not exist yet.
pub fn create_node(node: &Node) -> Statement {
    let labels = cypher::labels_clause(node.labels());
    Statement::write(format!("CREATE (n{labels} $props) RETURN n"))
        .param("props", stored_properties(node.id(), node.properties()))
        .columns(["n"])
}

/// Replace labels and properties of an existing node in one statement.
///
/// Labels cannot be removed dynamically in plain Cypher, so the current set
/// is stripped with `apoc.create.removeLabels`.
pub fn replace_node(node: &Node) -> Statement {
    let mut text = format!(
        "MATCH (n {}) \
         CALL apoc.create.removeLabels(n, labels(n)) YIELD node AS m ",
        identity_map("id")
    );
    if !node.labels().is_empty() {
        text.push_str(&format!("SET m{} ", cypher::labels_clause(node.labels())));
    }
    text.push_str("SET m = $props RETURN m AS n");

    Statement::write(text)
        .param("id", node.id())
        .param("props", stored_properties(node.id(), node.properties()))
        .columns(["n"])
}

pub fn read_node(id: &str) -> Statement {
    Statement::read(format!("MATCH (n {}) RETURN n", identity_map("id")))
        .param("id", id)
        .columns(["n"])
}

/// Union labels and merge properties into an existing node.
pub fn patch_node(id: &str, delta: &NodeDelta) -> Statement {
    let mut text = format!("MATCH (n {}) ", identity_map("id"));
    let mut statement = Statement::write(String::new()).param("id", id);

    if let Some(labels) = delta.labels.as_deref().filter(|l| !l.is_empty()) {
        text.push_str(&format!("SET n{} ", cypher::labels_clause(labels)));
    }
    if let Some(properties) = &delta.properties {
        text.push_str("SET n += $props ");
        statement = statement.param("props", PropertyValue::Map(properties.clone()));
    }
    text.push_str("RETURN n");

    statement.text = text;
    statement.columns(["n"])
}

/// Delete a node together with every incident relationship.
pub fn delete_node(id: &str) -> Statement {
    Statement::write(format!(
        "MATCH (n {}) DETACH DELETE n RETURN count(n) AS deleted",
        identity_map("id")
    ))
    .param("id", id)
    .columns(["deleted"])
}

pub fn node_exists(id: &str) -> Statement {
    Statement::read(format!(
        "MATCH (n {}) RETURN count(n) > 0 AS found",
        identity_map("id")
    ))
    .param("id", id)
    .columns(["found"])
}

// ── Links ────────────────────────────────────────────────────────

/// Create a relationship between two existing nodes, matched by identity
/// and scoped by their label sets.
pub fn create_link(link: &Link, source: &Node, target: &Node) -> Statement {
    let text = format!(
        "MATCH (a{} {}) MATCH (b{} {}) \
         CREATE (a)-[r{}]->(b) SET r = $props \
         RETURN a, r, b",
        cypher::labels_clause(source.labels()),
        identity_map("source"),
        cypher::labels_clause(target.labels()),
        identity_map("target"),
        cypher::label_token(link.label()),
    );
    link_params(Statement::write(text), link)
}

/// Replace an existing relationship. The type is immutable, so a new
/// relationship is created between the old one's endpoints and the old one
/// deleted in the same statement.
pub fn replace_link(link: &Link) -> Statement {
    let text = format!(
        "MATCH (a)-[old {}]->(b) \
         CREATE (a)-[r{}]->(b) SET r = $props \
         DELETE old \
         RETURN a, r, b",
        identity_map("id"),
        cypher::label_token(link.label()),
    );
    Statement::write(text)
        .param("id", link.id())
        .param("props", stored_properties(link.id(), link.properties()))
        .columns(["a", "r", "b"])
}

fn link_params(statement: Statement, link: &Link) -> Statement {
    statement
        .param("source", link.source())
        .param("target", link.target())
        .param("props", stored_properties(link.id(), link.properties()))
        .columns(["a", "r", "b"])
}

pub fn read_link(id: &str) -> Statement {
    Statement::read(format!(
        "MATCH (a)-[r {}]->(b) RETURN a, r, b",
        identity_map("id")
    ))
    .param("id", id)
    .columns(["a", "r", "b"])
}

/// Merge properties into a relationship, or recreate it under a new type
/// carrying its previous properties merged with the patch.
pub fn patch_link(id: &str, delta: &LinkDelta) -> Statement {
    let mut statement = Statement::write(String::new()).param("id", id);
    let mut text = match &delta.label {
        Some(label) => format!(
            "MATCH (a)-[old {}]->(b) \
             CREATE (a)-[r{}]->(b) SET r = properties(old) ",
            identity_map("id"),
            cypher::label_token(label),
        ),
        None => format!("MATCH (a)-[r {}]->(b) ", identity_map("id")),
    };
    if let Some(properties) = &delta.properties {
        text.push_str("SET r += $props ");
        statement = statement.param("props", PropertyValue::Map(properties.clone()));
    }
    if delta.label.is_some() {
        text.push_str("DELETE old ");
    }
    text.push_str("RETURN a, r, b");

    statement.text = text;
    statement.columns(["a", "r", "b"])
}

pub fn delete_link(id: &str) -> Statement {
    Statement::write(format!(
        "MATCH ()-[r {}]->() DELETE r RETURN count(r) AS deleted",
        identity_map("id")
    ))
    .param("id", id)
    .columns(["deleted"])
}

pub fn link_exists(id: &str) -> Statement {
    Statement::read(format!(
        "MATCH ()-[r {}]->() RETURN count(r) > 0 AS found",
        identity_map("id")
    ))
    .param("id", id)
    .columns(["found"])
}

// ── Whole Graph ──────────────────────────────────────────────────

/// Every node, each paired with zero or more outgoing relationships.
pub fn read_graph() -> Statement {
    Statement::read("MATCH (n) OPTIONAL MATCH (n)-[r]->(m) RETURN n, r, m").columns(["n", "r", "m"])
}

/// A caller-supplied statement, passed through untouched.
pub fn raw_query(query: &RawQuery) -> Statement {
    Statement::read(query.text()).columns(query.columns().iter().cloned())
}

pub fn clear_graph() -> Statement {
    Statement::write("MATCH (n) DETACH DELETE n")
}
