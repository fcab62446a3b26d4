//! # Command Layer
//!
//! The command catalogue and per-command execution over a graph.
//!
//! Every user-facing mutation, query and inspection is a [`Command`]
//! variant; [`CommandProcessor`](processor::CommandProcessor) parses
//! command lines into them and handles undo bookkeeping. Execution
//! returns a [`CommandResult`] rather than `Result`: a failed command
//! is a normal interactive outcome, carried as `success = false` with
//! a human-readable message, never as a propagated error.

pub mod processor;

use crate::graph::{Edge, EdgeDirection, Graph, Node};
use crate::types::AttrValue;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

// =============================================================================
// COMMAND CATALOGUE
// =============================================================================

/// Which kind of entity an `info` request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Edge,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Edge => "edge",
        })
    }
}

/// What a `list` command enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Nodes,
    Edges,
}

/// A parsed command line.
///
/// Property values are raw strings here; type detection happens on
/// assignment, so `--property Age=30` stores an integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateNode {
        id: String,
        properties: BTreeMap<String, String>,
    },
    EditNode {
        id: String,
        properties: BTreeMap<String, String>,
    },
    DeleteNode {
        id: String,
    },
    CreateEdge {
        id: String,
        source: String,
        target: String,
        directed: bool,
        properties: BTreeMap<String, String>,
    },
    EditEdge {
        id: String,
        properties: BTreeMap<String, String>,
    },
    DeleteEdge {
        id: String,
    },
    Filter {
        query: String,
    },
    Search {
        query: String,
    },
    Clear,
    Undo,
    Reset,
    Info {
        target: Option<(EntityKind, String)>,
    },
    List {
        target: Option<ListTarget>,
    },
    Help,
}

impl Command {
    /// Whether the command changes graph state and therefore deserves
    /// an undo snapshot. Undo itself, reset (delegated to the host)
    /// and pure inspection commands do not.
    #[must_use]
    pub fn supports_undo(&self) -> bool {
        matches!(
            self,
            Self::CreateNode { .. }
                | Self::EditNode { .. }
                | Self::DeleteNode { .. }
                | Self::CreateEdge { .. }
                | Self::EditEdge { .. }
                | Self::DeleteEdge { .. }
                | Self::Clear
                | Self::Filter { .. }
                | Self::Search { .. }
        )
    }

    /// Execute against a graph in place. Queries, undo and reset are
    /// the processor's business and report as failures here.
    pub(crate) fn run(&self, graph: &mut Graph) -> CommandResult {
        match self {
            Self::CreateNode { id, properties } => create_node(graph, id, properties),
            Self::EditNode { id, properties } => edit_node(graph, id, properties),
            Self::DeleteNode { id } => delete_node(graph, id),
            Self::CreateEdge {
                id,
                source,
                target,
                directed,
                properties,
            } => create_edge(graph, id, source, target, *directed, properties),
            Self::EditEdge { id, properties } => edit_edge(graph, id, properties),
            Self::DeleteEdge { id } => delete_edge(graph, id),
            Self::Clear => {
                graph.clear();
                CommandResult::ok("Graph cleared.")
            }
            Self::Info { target } => info(graph, target.as_ref()),
            Self::List { target } => list(graph, *target),
            Self::Help => CommandResult::ok(HELP_TEXT),
            Self::Filter { .. } | Self::Search { .. } | Self::Undo | Self::Reset => {
                CommandResult::fail("This command must run through the command processor.")
            }
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// A side-band request the host must honour; the processor itself
/// cannot (it only sees the current graph, not the workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Restore the workspace's original graph and clear history.
    Reset,
}

/// Outcome of processing one command line.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub action: Option<CommandAction>,
}

impl CommandResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            action: None,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            action: None,
        }
    }

    #[must_use]
    pub fn ok_with(message: impl Into<String>, action: CommandAction) -> Self {
        Self {
            success: true,
            message: message.into(),
            action: Some(action),
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

fn create_node(graph: &mut Graph, id: &str, properties: &BTreeMap<String, String>) -> CommandResult {
    if graph.contains_node(id) {
        return CommandResult::fail(format!("Node '{id}' already exists."));
    }
    let mut node = Node::new(id);
    for (key, value) in properties {
        node.attributes_mut().set(key.clone(), AttrValue::from(value.clone()));
    }
    match graph.add_node(node) {
        Ok(()) => CommandResult::ok(format!(
            "Node '{id}' created with {} attribute(s).",
            properties.len()
        )),
        Err(e) => CommandResult::fail(e.to_string()),
    }
}

fn edit_node(graph: &mut Graph, id: &str, properties: &BTreeMap<String, String>) -> CommandResult {
    let Some(node) = graph.node_mut(id) else {
        return CommandResult::fail(format!("Node '{id}' not found."));
    };
    for (key, value) in properties {
        node.attributes_mut().set(key.clone(), AttrValue::from(value.clone()));
    }
    let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    CommandResult::ok(format!("Node '{id}' updated: {}.", keys.join(", ")))
}

fn delete_node(graph: &mut Graph, id: &str) -> CommandResult {
    if !graph.contains_node(id) {
        return CommandResult::fail(format!("Node '{id}' not found."));
    }
    let incident: Vec<String> = graph
        .incident_edges(id)
        .iter()
        .map(|e| format!("'{}'", e.id()))
        .collect();
    if !incident.is_empty() {
        return CommandResult::fail(format!(
            "Cannot delete node '{id}': {} connected edge(s) ({}). Delete the edges first.",
            incident.len(),
            incident.join(", ")
        ));
    }
    match graph.remove_node(id) {
        Ok(()) => CommandResult::ok(format!("Node '{id}' deleted.")),
        Err(e) => CommandResult::fail(e.to_string()),
    }
}

fn create_edge(
    graph: &mut Graph,
    id: &str,
    source: &str,
    target: &str,
    directed: bool,
    properties: &BTreeMap<String, String>,
) -> CommandResult {
    if !graph.contains_node(source) {
        return CommandResult::fail(format!("Source node '{source}' not found."));
    }
    if !graph.contains_node(target) {
        return CommandResult::fail(format!("Target node '{target}' not found."));
    }
    if graph.contains_edge(id) {
        return CommandResult::fail(format!("Edge '{id}' already exists."));
    }
    let direction = if directed {
        EdgeDirection::Directed
    } else {
        EdgeDirection::Undirected
    };
    let mut edge = Edge::new(id, source, target, direction);
    for (key, value) in properties {
        edge.attributes_mut().set(key.clone(), AttrValue::from(value.clone()));
    }
    match graph.add_edge(edge) {
        Ok(()) => CommandResult::ok(format!(
            "Edge '{id}' created: {source} {} {target}.",
            arrow(directed)
        )),
        Err(e) => CommandResult::fail(e.to_string()),
    }
}

fn edit_edge(graph: &mut Graph, id: &str, properties: &BTreeMap<String, String>) -> CommandResult {
    let Some(edge) = graph.edge_mut(id) else {
        return CommandResult::fail(format!("Edge '{id}' not found."));
    };
    for (key, value) in properties {
        edge.attributes_mut().set(key.clone(), AttrValue::from(value.clone()));
    }
    let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    CommandResult::ok(format!("Edge '{id}' updated: {}.", keys.join(", ")))
}

fn delete_edge(graph: &mut Graph, id: &str) -> CommandResult {
    if graph.remove_edge(id) {
        CommandResult::ok(format!("Edge '{id}' deleted."))
    } else {
        CommandResult::fail(format!("Edge '{id}' not found."))
    }
}

fn info(graph: &Graph, target: Option<&(EntityKind, String)>) -> CommandResult {
    match target {
        None => CommandResult::ok(format!(
            "Graph '{}': {} node(s), {} edge(s), cycle: {}.",
            graph.id(),
            graph.node_count(),
            graph.edge_count(),
            if graph.has_cycle() { "yes" } else { "no" }
        )),
        Some((EntityKind::Node, id)) => {
            let Some(node) = graph.node(id) else {
                return CommandResult::fail(format!("Node '{id}' not found."));
            };
            let mut out = format!("Node '{id}'");
            out.push_str(&render_attributes(node.attributes()));
            CommandResult::ok(out)
        }
        Some((EntityKind::Edge, id)) => {
            let Some(edge) = graph.edge(id) else {
                return CommandResult::fail(format!("Edge '{id}' not found."));
            };
            let mut out = format!(
                "Edge '{id}': {} {} {}",
                edge.source(),
                arrow(edge.is_directed()),
                edge.target()
            );
            out.push_str(&render_attributes(edge.attributes()));
            CommandResult::ok(out)
        }
    }
}

fn render_attributes(attrs: &crate::types::Attributes) -> String {
    if attrs.is_empty() {
        return " (no attributes)".to_string();
    }
    let mut out = String::new();
    for (key, value) in attrs.iter() {
        let tag = attrs.type_of(key).map_or("?", |t| t.as_str());
        let _ = write!(out, "\n  {key} = {value} ({tag})");
    }
    out
}

fn list(graph: &Graph, target: Option<ListTarget>) -> CommandResult {
    let mut out = String::new();
    let show_nodes = !matches!(target, Some(ListTarget::Edges));
    let show_edges = !matches!(target, Some(ListTarget::Nodes));

    if show_nodes {
        let _ = write!(out, "Nodes ({}):", graph.node_count());
        for node in graph.nodes() {
            let _ = write!(out, "\n  {} [{} attribute(s)]", node.id(), node.attributes().len());
        }
    }
    if show_edges {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "Edges ({}):", graph.edge_count());
        for edge in graph.edges() {
            let _ = write!(
                out,
                "\n  {}: {} {} {}",
                edge.id(),
                edge.source(),
                arrow(edge.is_directed()),
                edge.target()
            );
        }
    }
    CommandResult::ok(out)
}

const fn arrow(directed: bool) -> &'static str {
    if directed {
        "->"
    } else {
        "--"
    }
}

const HELP_TEXT: &str = "\
Available commands:
  create node --id=<id> [--property K=V ...]
  edit node --id=<id> --property K=V [...]
  delete node --id=<id>
  create edge --id=<id> [--directed|--undirected] [--property K=V ...] <source> <target>
  edit edge --id=<id> --property K=V [...]
  delete edge --id=<id>
  filter <attribute> <op> <value>     op: == != > < >= <=
  search <name>=<value> | <token>
  list [nodes|edges]
  info [node|edge <id>]
  clear                               remove all nodes and edges
  undo                                revert the last change
  reset                               restore the originally loaded graph
  help                                show this text
Comments start with unquoted '#'. Quote values containing spaces.";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn create_node_detects_property_types() {
        let mut g = Graph::new("g");
        let result = Command::CreateNode {
            id: "a".into(),
            properties: props(&[("Age", "30"), ("Name", "Alice")]),
        }
        .run(&mut g);
        assert!(result.success);

        let node = g.node("a").expect("node");
        assert_eq!(node.attributes().get("Age"), Some(&AttrValue::Int(30)));
        assert_eq!(node.attributes().type_of("Name"), Some(ValueType::Str));
    }

    #[test]
    fn create_duplicate_node_fails_softly() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a")).expect("add");
        let result = Command::CreateNode {
            id: "a".into(),
            properties: BTreeMap::new(),
        }
        .run(&mut g);
        assert!(!result.success);
        assert!(result.message.contains("already exists"));
    }

    #[test]
    fn delete_node_blocked_by_incident_edges() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a")).expect("add");
        g.add_node(Node::new("b")).expect("add");
        g.add_edge(Edge::new("e", "a", "b", EdgeDirection::Directed))
            .expect("add");

        let result = Command::DeleteNode { id: "a".into() }.run(&mut g);
        assert!(!result.success);
        // Edge ids are listed quoted, like the node id itself.
        assert!(result.message.contains("1 connected edge(s) ('e')"));
        assert!(g.contains_node("a"));

        g.remove_edge("e");
        let result = Command::DeleteNode { id: "a".into() }.run(&mut g);
        assert!(result.success);
        assert!(!g.contains_node("a"));
    }

    #[test]
    fn create_edge_direction_and_messages() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a")).expect("add");
        g.add_node(Node::new("b")).expect("add");

        let result = Command::CreateEdge {
            id: "e".into(),
            source: "a".into(),
            target: "b".into(),
            directed: false,
            properties: BTreeMap::new(),
        }
        .run(&mut g);
        assert!(result.success);
        assert!(result.message.contains("a -- b"));
        assert!(!g.edge("e").expect("edge").is_directed());

        let result = Command::CreateEdge {
            id: "e2".into(),
            source: "a".into(),
            target: "ghost".into(),
            directed: true,
            properties: BTreeMap::new(),
        }
        .run(&mut g);
        assert!(!result.success);
        assert!(result.message.contains("Target node 'ghost'"));
    }

    #[test]
    fn edit_edge_updates_attributes() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a")).expect("add");
        g.add_edge(Edge::new("e", "a", "a", EdgeDirection::Directed))
            .expect("add");
        let result = Command::EditEdge {
            id: "e".into(),
            properties: props(&[("Weight", "2.5")]),
        }
        .run(&mut g);
        assert!(result.success);
        assert_eq!(
            g.edge("e").expect("edge").attributes().get("Weight"),
            Some(&AttrValue::Float(2.5))
        );
    }

    #[test]
    fn info_reports_graph_and_entities() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a").with_attribute("Age", AttrValue::from("30")))
            .expect("add");

        let result = Command::Info { target: None }.run(&mut g);
        assert!(result.message.contains("1 node(s)"));
        assert!(result.message.contains("cycle: no"));

        let result = Command::Info {
            target: Some((EntityKind::Node, "a".into())),
        }
        .run(&mut g);
        assert!(result.message.contains("Age = 30 (int)"));

        let result = Command::Info {
            target: Some((EntityKind::Edge, "nope".into())),
        }
        .run(&mut g);
        assert!(!result.success);
    }

    #[test]
    fn list_filters_by_target() {
        let mut g = Graph::new("g");
        g.add_node(Node::new("a")).expect("add");
        g.add_node(Node::new("b")).expect("add");
        g.add_edge(Edge::new("e", "a", "b", EdgeDirection::Undirected))
            .expect("add");

        let all = Command::List { target: None }.run(&mut g);
        assert!(all.message.contains("Nodes (2):"));
        assert!(all.message.contains("Edges (1):"));

        let nodes_only = Command::List {
            target: Some(ListTarget::Nodes),
        }
        .run(&mut g);
        assert!(!nodes_only.message.contains("Edges"));
    }

    #[test]
    fn undoable_classification() {
        assert!(Command::Clear.supports_undo());
        assert!(Command::Filter { query: "a == 1".into() }.supports_undo());
        assert!(!Command::Undo.supports_undo());
        assert!(!Command::Reset.supports_undo());
        assert!(!Command::Help.supports_undo());
        assert!(!Command::List { target: None }.supports_undo());
    }
}
