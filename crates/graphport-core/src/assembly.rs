//! Graph assembly: reconcile flat node and link fragments into a `Graph`.
//!
//! Whole-graph scans return one row per (node, relationship) pair, so the
//! same node typically arrives many times. The assembler keeps the first
//! occurrence of every node and link id and checks that each link's
//! endpoints were collected.

use std::collections::{HashMap, HashSet};

use crate::types::{Graph, Link, Node};

/// What to do with a link whose endpoint never appeared as a node fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointPolicy {
    /// Best effort: skip the link and keep assembling.
    #[default]
    Drop,
    /// Strict: abort assembly.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Link {link_id} references node {node_id}, which is not part of the graph")]
    UnresolvedEndpoint { link_id: String, node_id: String },
}

/// Incremental builder for [`Graph`] snapshots.
#[derive(Debug, Default)]
pub struct GraphAssembler {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    link_ids: HashSet<String>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node fragment. Returns `false` if the id was already collected.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(node.id()) {
            return false;
        }
        self.index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add a link fragment. Returns `false` if the id was already collected.
    pub fn add_link(&mut self, link: Link) -> bool {
        if !self.link_ids.insert(link.id().to_string()) {
            return false;
        }
        self.links.push(link);
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Resolve link endpoints and produce the snapshot.
    pub fn finish(self, policy: EndpointPolicy) -> Result<Graph, AssemblyError> {
        let Self {
            nodes, index, links, ..
        } = self;

        let mut resolved = Vec::with_capacity(links.len());
        for link in links {
            let missing = [link.source(), link.target()]
                .into_iter()
                .find(|id| !index.contains_key(*id))
                .map(str::to_string);

            match (missing, policy) {
                (None, _) => resolved.push(link),
                (Some(node_id), EndpointPolicy::Drop) => {
                    tracing::warn!(
                        link_id = %link.id(),
                        node_id = %node_id,
                        "Dropping link with unresolved endpoint"
                    );
                }
                (Some(node_id), EndpointPolicy::Fail) => {
                    return Err(AssemblyError::UnresolvedEndpoint {
                        link_id: link.id().to_string(),
                        node_id,
                    });
                }
            }
        }

        Ok(Graph::from_parts(nodes, resolved, index))
    }
}

/// Assemble a graph from complete fragment lists in one call.
pub fn assemble(
    nodes: impl IntoIterator<Item = Node>,
    links: impl IntoIterator<Item = Link>,
    policy: EndpointPolicy,
) -> Result<Graph, AssemblyError> {
    let mut assembler = GraphAssembler::new();
    for node in nodes {
        assembler.add_node(node);
    }
    for link in links {
        assembler.add_link(link);
    }
    assembler.finish(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Properties, PropertyValue};

    fn node(id: &str, name: &str) -> Node {
        let mut props = Properties::new();
        props.insert("name".into(), PropertyValue::from(name));
        Node::new(id, ["Person"], props).unwrap()
    }

    fn link(id: &str, source: &str, target: &str) -> Link {
        Link::new(id, "WORKS_WITH", Properties::new(), source, target).unwrap()
    }

    #[test]
    fn test_nodes_deduplicated_first_wins() {
        let graph = assemble(
            vec![node("a", "Ada"), node("b", "Bob"), node("a", "Impostor")],
            vec![],
            EndpointPolicy::Drop,
        )
        .unwrap();

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(
            graph.node("a").unwrap().property("name").and_then(|v| v.as_str()),
            Some("Ada")
        );
    }

    #[test]
    fn test_links_resolve_to_node_objects() {
        let graph = assemble(
            vec![node("a", "Ada"), node("b", "Bob")],
            vec![link("l1", "a", "b"), link("l1", "b", "a")],
            EndpointPolicy::Fail,
        )
        .unwrap();

        assert_eq!(graph.links().len(), 1);
        let (l, source, target) = graph.resolved_links().next().unwrap();
        assert_eq!(l.id(), "l1");
        assert_eq!(source.id(), "a");
        assert_eq!(target.id(), "b");
    }

    #[test]
    fn test_unresolved_endpoint_dropped_in_scan() {
        let graph = assemble(
            vec![node("a", "Ada")],
            vec![link("l1", "a", "ghost"), link("l2", "a", "a")],
            EndpointPolicy::Drop,
        )
        .unwrap();

        assert_eq!(graph.links().len(), 1);
        assert_eq!(graph.links()[0].id(), "l2");
    }

    #[test]
    fn test_unresolved_endpoint_fails_strict() {
        let err = assemble(
            vec![node("a", "Ada")],
            vec![link("l1", "ghost", "a")],
            EndpointPolicy::Fail,
        )
        .unwrap_err();

        assert_eq!(
            err,
            AssemblyError::UnresolvedEndpoint {
                link_id: "l1".into(),
                node_id: "ghost".into()
            }
        );
    }

    #[test]
    fn test_incremental_counts() {
        let mut assembler = GraphAssembler::new();
        assert!(assembler.add_node(node("a", "Ada")));
        assert!(!assembler.add_node(node("a", "Ada")));
        assert!(assembler.add_link(link("l1", "a", "a")));
        assert!(!assembler.add_link(link("l1", "a", "a")));
        assert_eq!(assembler.node_count(), 1);
        assert_eq!(assembler.link_count(), 1);
        assert!(!assembler.finish(EndpointPolicy::Drop).unwrap().is_empty());
    }
}
