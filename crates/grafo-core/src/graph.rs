//! # Graph Store
//!
//! Nodes, edges and the graph container.
//!
//! The graph owns its nodes and edges outright and keeps an adjacency
//! index (node id → incident edge ids) in lockstep with every mutation.
//! Mutations validate before they touch anything, so a failed call
//! leaves the graph exactly as it was.
//!
//! Storage is `BTreeMap` throughout: iteration order is the key order,
//! which keeps listings, query results and tests deterministic.

use crate::types::{AttrValue, Attributes, GraphError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

// =============================================================================
// NODES
// =============================================================================

/// A graph node: an identifier plus typed attributes.
///
/// Identity is the id alone — two nodes with the same id are equal
/// regardless of attribute state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: String,
    attributes: Attributes,
}

impl Node {
    /// Create a node with no attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute assignment with type detection.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.set(key, value);
        self
    }

    /// The node identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Typed attributes, read-only.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Typed attributes, mutable.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Whether an edge is traversable in one direction or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    Directed,
    Undirected,
}

/// A graph edge between two node ids, directed or undirected, with
/// typed attributes. Identity is the id alone, like [`Node`].
///
/// Endpoints are stored as owned id strings; referential integrity is
/// enforced by [`Graph::add_edge`], not by shared references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    id: String,
    source: String,
    target: String,
    direction: EdgeDirection,
    attributes: Attributes,
}

impl Edge {
    /// Create an edge. Direction defaults are the caller's concern.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        direction: EdgeDirection,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            direction,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute assignment with type detection.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.set(key, value);
        self
    }

    /// The edge identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source endpoint node id.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target endpoint node id.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Direction of traversal.
    #[must_use]
    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }

    /// Whether the edge is directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.direction == EdgeDirection::Directed
    }

    /// Whether the edge is a self-loop.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Given one endpoint id, the other endpoint. For a self-loop both
    /// ends are the same node. `None` if `node_id` is not an endpoint.
    #[must_use]
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if node_id == self.source {
            Some(&self.target)
        } else if node_id == self.target {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Whether the edge touches `node_id` at either end.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Typed attributes, read-only.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Typed attributes, mutable.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// A mixed directed/undirected attribute graph.
///
/// Maintains three structures in lockstep: the node map, the edge map
/// and the adjacency index. A self-loop appears exactly once in its
/// node's adjacency list.
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    id: String,
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
    adjacency: BTreeMap<String, Vec<String>>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
        }
    }

    /// The graph identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add a node. Fails on a duplicate id without touching the graph.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(node.id()) {
            return Err(GraphError::DuplicateNode(node.id().to_string()));
        }
        self.adjacency.insert(node.id().to_string(), Vec::new());
        self.nodes.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already exist and the id must
    /// be unused; all checks run before any mutation.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for endpoint in [edge.source(), edge.target()] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::EndpointMissing {
                    edge: edge.id().to_string(),
                    node: endpoint.to_string(),
                });
            }
        }
        if self.edges.contains_key(edge.id()) {
            return Err(GraphError::DuplicateEdge(edge.id().to_string()));
        }
        self.index_edge(&edge);
        self.edges.insert(edge.id().to_string(), edge);
        Ok(())
    }

    /// Remove a node and cascade-remove every incident edge.
    pub fn remove_node(&mut self, node_id: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(node_id) {
            return Err(GraphError::NodeNotFound(node_id.to_string()));
        }
        // Collect first: removal edits the adjacency list being read.
        let incident: Vec<String> = self
            .adjacency
            .get(node_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        for edge_id in incident {
            self.remove_edge(&edge_id);
        }
        self.adjacency.remove(node_id);
        self.nodes.remove(node_id);
        Ok(())
    }

    /// Remove an edge. Removing an absent edge is a no-op, not a
    /// failure; returns whether an edge was actually removed.
    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let Some(edge) = self.edges.remove(edge_id) else {
            return false;
        };
        for endpoint in [edge.source(), edge.target()] {
            if let Some(ids) = self.adjacency.get_mut(endpoint) {
                ids.retain(|id| id != edge_id);
            }
        }
        true
    }

    /// Remove every node and edge, keeping the graph id.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    /// Look up a node.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Look up a node for mutation.
    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Look up an edge.
    #[must_use]
    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Look up an edge for mutation.
    pub fn edge_mut(&mut self, edge_id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(edge_id)
    }

    /// Whether the node exists.
    #[must_use]
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Whether the edge exists.
    #[must_use]
    pub fn contains_edge(&self, edge_id: &str) -> bool {
        self.edges.contains_key(edge_id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every edge touching the node, regardless of direction.
    #[must_use]
    pub fn incident_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.adjacency
            .get(node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Edges leaving the node: directed edges whose source it is, plus
    /// undirected edges at either end.
    #[must_use]
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.incident_edges(node_id)
            .into_iter()
            .filter(|e| e.source() == node_id || !e.is_directed())
            .collect()
    }

    /// Edges arriving at the node: directed edges whose target it is,
    /// plus undirected edges at either end.
    #[must_use]
    pub fn incoming_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.incident_edges(node_id)
            .into_iter()
            .filter(|e| e.target() == node_id || !e.is_directed())
            .collect()
    }

    /// Distinct neighbors across all incident edges, in id order. A
    /// self-loop makes a node its own neighbor.
    #[must_use]
    pub fn neighbors(&self, node_id: &str) -> Vec<&Node> {
        let ids: BTreeSet<&str> = self
            .incident_edges(node_id)
            .into_iter()
            .filter_map(|e| e.other_end(node_id))
            .collect();
        ids.into_iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    /// Degree of the node (self-loops count once).
    #[must_use]
    pub fn degree(&self, node_id: &str) -> usize {
        self.adjacency.get(node_id).map_or(0, Vec::len)
    }

    // -------------------------------------------------------------------------
    // Cycle detection
    // -------------------------------------------------------------------------

    /// Whether the graph contains a cycle.
    ///
    /// DFS over every component. A back-edge into the recursion stack
    /// is a cycle outright for directed edges; for undirected edges it
    /// only counts when it does not lead straight back to the DFS
    /// parent (a single undirected edge is not a two-node cycle). A
    /// self-loop is always a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = BTreeSet::new();
        for node_id in self.nodes.keys() {
            if !visited.contains(node_id.as_str())
                && self.cycle_dfs(node_id, None, &mut visited, &mut stack)
            {
                return true;
            }
        }
        false
    }

    fn cycle_dfs<'a>(
        &'a self,
        node_id: &'a str,
        parent: Option<&str>,
        visited: &mut BTreeSet<&'a str>,
        stack: &mut BTreeSet<&'a str>,
    ) -> bool {
        visited.insert(node_id);
        stack.insert(node_id);

        for edge in self.outgoing_edges(node_id) {
            let Some(neighbor) = edge.other_end(node_id) else {
                continue;
            };
            if !visited.contains(neighbor) {
                if self.cycle_dfs(neighbor, Some(node_id), visited, stack) {
                    return true;
                }
            } else if stack.contains(neighbor) {
                if edge.is_directed() || parent != Some(neighbor) || edge.is_self_loop() {
                    return true;
                }
            }
        }

        stack.remove(node_id);
        false
    }

    // -------------------------------------------------------------------------
    // Subgraph extraction
    // -------------------------------------------------------------------------

    /// The subgraph induced by `node_ids`: deep copies of the selected
    /// nodes plus every edge whose endpoints are both selected. The
    /// result is fully independent of this graph. Absent ids are
    /// silently skipped.
    #[must_use]
    pub fn subgraph(&self, node_ids: &BTreeSet<String>) -> Self {
        let mut sub = Self::new(format!("{}_sub", self.id));
        for id in node_ids {
            if let Some(node) = self.nodes.get(id) {
                sub.adjacency.insert(id.clone(), Vec::new());
                sub.nodes.insert(id.clone(), node.clone());
            }
        }
        for edge in self.edges.values() {
            if sub.nodes.contains_key(edge.source()) && sub.nodes.contains_key(edge.target()) {
                sub.index_edge(edge);
                sub.edges.insert(edge.id().to_string(), edge.clone());
            }
        }
        sub
    }

    /// Register an edge in the adjacency index. A self-loop is listed
    /// once, not twice.
    fn index_edge(&mut self, edge: &Edge) {
        self.adjacency
            .entry(edge.source().to_string())
            .or_default()
            .push(edge.id().to_string());
        if edge.source() != edge.target() {
            self.adjacency
                .entry(edge.target().to_string())
                .or_default()
                .push(edge.id().to_string());
        }
    }

}

// =============================================================================
// TESTS
// =============================================================================
