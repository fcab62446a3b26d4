//! # Command Processor
//!
//! Turns raw command lines into [`Command`]s and executes them with
//! undo bookkeeping.
//!
//! Parsing is shell-like: whitespace-separated tokens, single or
//! double quotes grouping (quotes stripped), and an unquoted `#`
//! starting a comment. Unknown `--flags` are ignored rather than
//! rejected.
//!
//! Undo works by snapshot: before a mutating command runs, the
//! processor clones the graph; on success the (command, snapshot) pair
//! is pushed onto a bounded stack. Query commands snapshot the view
//! they replace. Failed commands and parse errors never touch the
//! stack.

use super::{Command, CommandAction, CommandResult, EntityKind, ListTarget};
use crate::graph::Graph;
use crate::query;
use crate::types::GraphError;
use std::collections::BTreeMap;
use std::mem;

/// Default depth of the undo stack.
pub const DEFAULT_UNDO_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy)]
enum QueryKind {
    Filter,
    Search,
}

/// Stateful command executor with a bounded undo stack.
#[derive(Debug)]
pub struct CommandProcessor {
    undo_stack: Vec<(Command, Graph)>,
    max_undo: usize,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessor {
    /// Create a processor with the default undo depth.
    #[must_use]
    pub fn new() -> Self {
        Self::with_undo_depth(DEFAULT_UNDO_DEPTH)
    }

    /// Create a processor with an explicit undo depth. When the stack
    /// is full the oldest entry is evicted.
    #[must_use]
    pub fn with_undo_depth(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            max_undo,
        }
    }

    /// Number of commands currently undoable.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Parse and execute one command line against `graph`.
    ///
    /// Comment-only and empty lines fail softly; so do parse errors
    /// and command failures. The graph is mutated in place; a `reset`
    /// line reports [`CommandAction::Reset`] for the host to honour.
    pub fn process(&mut self, line: &str, graph: &mut Graph) -> CommandResult {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return CommandResult::fail("Empty command. Type 'help' for usage.");
        }
        match parse(line) {
            Ok(command) => self.execute(command, graph),
            Err(e) => CommandResult::fail(format!("Parse error: {e}")),
        }
    }

    fn execute(&mut self, command: Command, graph: &mut Graph) -> CommandResult {
        match command {
            Command::Undo => self.undo(graph),
            // The workspace owns the original graph; hand the request up.
            Command::Reset => {
                CommandResult::ok_with("Reset requested.", CommandAction::Reset)
            }
            Command::Filter { query } => self.run_query(QueryKind::Filter, query, graph),
            Command::Search { query } => self.run_query(QueryKind::Search, query, graph),
            command => {
                let snapshot = if command.supports_undo() {
                    Some(graph.clone())
                } else {
                    None
                };
                let result = command.run(graph);
                if result.success {
                    if let Some(snapshot) = snapshot {
                        self.push_undo(command, snapshot);
                    }
                }
                result
            }
        }
    }

    /// Run a query and swap its result in as the current graph; the
    /// replaced view becomes the undo snapshot.
    fn run_query(&mut self, kind: QueryKind, query_str: String, graph: &mut Graph) -> CommandResult {
        let outcome = match kind {
            QueryKind::Filter => query::filter(graph, &query_str),
            QueryKind::Search => query::search(graph, &query_str),
        };
        match outcome {
            Ok(result_graph) => {
                let nodes = result_graph.node_count();
                let edges = result_graph.edge_count();
                let previous = mem::replace(graph, result_graph);
                let (command, message) = match kind {
                    QueryKind::Filter => (
                        Command::Filter { query: query_str.clone() },
                        format!(
                            "Filter '{query_str}' applied: {nodes} node(s), {edges} edge(s) remaining."
                        ),
                    ),
                    QueryKind::Search => (
                        Command::Search { query: query_str.clone() },
                        format!("Search '{query_str}': {nodes} node(s), {edges} edge(s) found."),
                    ),
                };
                self.push_undo(command, previous);
                CommandResult::ok(message)
            }
            Err(e) => {
                let label = match kind {
                    QueryKind::Filter => "Filter",
                    QueryKind::Search => "Search",
                };
                CommandResult::fail(format!("{label} error: {e}"))
            }
        }
    }

    fn undo(&mut self, graph: &mut Graph) -> CommandResult {
        match self.undo_stack.pop() {
            Some((_, snapshot)) => {
                *graph = snapshot;
                CommandResult::ok(format!(
                    "Undo successful ({} change(s) remaining).",
                    self.undo_stack.len()
                ))
            }
            None => CommandResult::fail("Nothing to undo."),
        }
    }

    fn push_undo(&mut self, command: Command, snapshot: Graph) {
        if self.max_undo == 0 {
            return;
        }
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push((command, snapshot));
    }
}

// =============================================================================
// TOKENIZING
// =============================================================================

/// Cut the line at the first `#` that is outside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Shell-like tokenizer: whitespace splits, quotes group and are
/// stripped. An unterminated quote falls back to plain whitespace
/// splitting of the raw line.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_current = false;
    let mut in_single = false;
    let mut in_double = false;

    for c in line.chars() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                has_current = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                has_current = true;
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if has_current {
                    tokens.push(mem::take(&mut current));
                    has_current = false;
                }
            }
            c => {
                current.push(c);
                has_current = true;
            }
        }
    }
    if in_single || in_double {
        return line.split_whitespace().map(str::to_string).collect();
    }
    if has_current {
        tokens.push(current);
    }
    tokens
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a pre-stripped, non-empty command line.
fn parse(line: &str) -> Result<Command, GraphError> {
    let tokens = tokenize(line);
    let Some(verb) = tokens.first() else {
        return Err(GraphError::CommandParse("empty command".into()));
    };

    match verb.to_lowercase().as_str() {
        "help" => Ok(Command::Help),
        "undo" => Ok(Command::Undo),
        "reset" => Ok(Command::Reset),
        "clear" => Ok(Command::Clear),
        "filter" => Ok(Command::Filter {
            query: tokens[1..].join(" "),
        }),
        "search" => Ok(Command::Search {
            query: tokens[1..].join(" "),
        }),
        "list" => parse_list(&tokens[1..]),
        "info" => parse_info(&tokens[1..]),
        "create" | "edit" | "delete" => parse_entity_command(verb, &tokens[1..]),
        other => Err(GraphError::CommandParse(format!(
            "unknown command '{other}'; type 'help' for usage"
        ))),
    }
}

fn parse_list(args: &[String]) -> Result<Command, GraphError> {
    let target = match args.first().map(|s| s.to_lowercase()) {
        None => None,
        Some(t) if t == "nodes" => Some(ListTarget::Nodes),
        Some(t) if t == "edges" => Some(ListTarget::Edges),
        Some(other) => {
            return Err(GraphError::CommandParse(format!(
                "unknown list target '{other}'; use 'nodes' or 'edges'"
            )));
        }
    };
    Ok(Command::List { target })
}

fn parse_info(args: &[String]) -> Result<Command, GraphError> {
    let Some(kind) = args.first() else {
        return Ok(Command::Info { target: None });
    };
    let kind = match kind.to_lowercase().as_str() {
        "node" => EntityKind::Node,
        "edge" => EntityKind::Edge,
        _ => {
            return Err(GraphError::CommandParse(
                "usage: info [node|edge <id>]".into(),
            ));
        }
    };
    let Some(id) = args.get(1) else {
        return Err(GraphError::CommandParse(
            "usage: info [node|edge <id>]".into(),
        ));
    };
    Ok(Command::Info {
        target: Some((kind, id.clone())),
    })
}

fn parse_entity_command(verb: &str, args: &[String]) -> Result<Command, GraphError> {
    let entity = args
        .first()
        .map(|s| s.to_lowercase())
        .ok_or_else(|| GraphError::CommandParse(format!("usage: {verb} node|edge ...")))?;
    let rest = &args[1..];

    match (verb, entity.as_str()) {
        ("create", "node") => {
            let (id, rest) = extract_id(rest)?;
            let (properties, _) = extract_properties(&rest)?;
            Ok(Command::CreateNode { id, properties })
        }
        ("edit", "node") => {
            let (id, rest) = extract_id(rest)?;
            let (properties, _) = extract_properties(&rest)?;
            if properties.is_empty() {
                return Err(GraphError::CommandParse(
                    "edit requires at least one --property K=V".into(),
                ));
            }
            Ok(Command::EditNode { id, properties })
        }
        ("delete", "node") => {
            let (id, _) = extract_id(rest)?;
            Ok(Command::DeleteNode { id })
        }
        ("create", "edge") => {
            let (id, rest) = extract_id(rest)?;
            let (properties, rest) = extract_properties(&rest)?;
            let mut directed = true;
            let mut positionals = Vec::new();
            for token in rest {
                match token.as_str() {
                    "--directed" => directed = true,
                    "--undirected" => directed = false,
                    t if t.starts_with("--") => {} // unknown flags ignored
                    _ => positionals.push(token),
                }
            }
            if positionals.len() < 2 {
                return Err(GraphError::CommandParse(
                    "create edge requires <source> and <target> node ids".into(),
                ));
            }
            // The last two positionals are the endpoints.
            let target = positionals.pop().unwrap_or_default();
            let source = positionals.pop().unwrap_or_default();
            Ok(Command::CreateEdge {
                id,
                source,
                target,
                directed,
                properties,
            })
        }
        ("edit", "edge") => {
            let (id, rest) = extract_id(rest)?;
            let (properties, _) = extract_properties(&rest)?;
            if properties.is_empty() {
                return Err(GraphError::CommandParse(
                    "edit requires at least one --property K=V".into(),
                ));
            }
            Ok(Command::EditEdge { id, properties })
        }
        ("delete", "edge") => {
            let (id, _) = extract_id(rest)?;
            Ok(Command::DeleteEdge { id })
        }
        _ => Err(GraphError::CommandParse(format!(
            "unknown target '{entity}' for '{verb}'; expected 'node' or 'edge'"
        ))),
    }
}

/// Pull `--id=<v>` or `--id <v>` out of the tokens, returning the id
/// and the remaining tokens.
fn extract_id(tokens: &[String]) -> Result<(String, Vec<String>), GraphError> {
    let mut id = None;
    let mut rest = Vec::new();
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if let Some(value) = token.strip_prefix("--id=") {
            id = Some(value.to_string());
        } else if token == "--id" {
            match iter.next() {
                Some(value) => id = Some(value.clone()),
                None => {
                    return Err(GraphError::CommandParse("--id requires a value".into()));
                }
            }
        } else {
            rest.push(token.clone());
        }
    }
    match id {
        Some(id) if !id.is_empty() => Ok((id, rest)),
        _ => Err(GraphError::CommandParse("missing required --id=<value>".into())),
    }
}

/// Pull every `--property K=V` / `--property=K=V` pair out of the
/// tokens, returning the map and the remaining tokens.
fn extract_properties(
    tokens: &[String],
) -> Result<(BTreeMap<String, String>, Vec<String>), GraphError> {
    let mut properties = BTreeMap::new();
    let mut rest = Vec::new();
    let mut iter = tokens.iter();

    let mut insert = |pair: &str| -> Result<(), GraphError> {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(GraphError::CommandParse(format!(
                "invalid property '{pair}'; expected K=V"
            )));
        };
        if key.is_empty() {
            return Err(GraphError::CommandParse(format!(
                "invalid property '{pair}'; expected K=V"
            )));
        }
        properties.insert(key.to_string(), value.to_string());
        Ok(())
    };

    while let Some(token) = iter.next() {
        if let Some(pair) = token.strip_prefix("--property=") {
            insert(pair)?;
        } else if token == "--property" {
            match iter.next() {
                Some(pair) => insert(pair)?,
                None => {
                    return Err(GraphError::CommandParse(
                        "--property requires a K=V value".into(),
                    ));
                }
            }
        } else {
            rest.push(token.clone());
        }
    }
    Ok((properties, rest))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::types::AttrValue;

    fn graph_with(ids: &[&str]) -> Graph {
        let mut g = Graph::new("g");
        for id in ids {
            g.add_node(Node::new(*id)).expect("add");
        }
        g
    }

    // --- tokenizing ---

    #[test]
    fn quotes_group_and_are_stripped() {
        assert_eq!(
            tokenize("edit node --id=a --property Name=\"Alice Smith\""),
            vec!["edit", "node", "--id=a", "--property", "Name=Alice Smith"]
        );
        assert_eq!(tokenize("filter 'Age >= 30'"), vec!["filter", "Age >= 30"]);
    }

    #[test]
    fn unterminated_quote_falls_back_to_whitespace_split() {
        assert_eq!(
            tokenize("create node --id='broken"),
            vec!["create", "node", "--id='broken"]
        );
    }

    #[test]
    fn comments_strip_outside_quotes_only() {
        assert_eq!(strip_comment("create node --id=a # trailing"), "create node --id=a ");
        assert_eq!(
            strip_comment("edit node --id=a --property Tag='#1'"),
            "edit node --id=a --property Tag='#1'"
        );
        assert_eq!(strip_comment("# whole line"), "");
    }

    // --- parsing ---

    #[test]
    fn parse_create_node_with_properties() {
        let cmd = parse("create node --id=a --property Age=30 --property=Name=Alice")
            .expect("parse");
        let Command::CreateNode { id, properties } = cmd else {
            unreachable!("wrong variant");
        };
        assert_eq!(id, "a");
        assert_eq!(properties.get("Age").map(String::as_str), Some("30"));
        assert_eq!(properties.get("Name").map(String::as_str), Some("Alice"));
    }

    #[test]
    fn parse_id_space_form() {
        let cmd = parse("delete node --id a").expect("parse");
        assert_eq!(cmd, Command::DeleteNode { id: "a".into() });
    }

    #[test]
    fn parse_missing_id_fails() {
        assert!(parse("create node").is_err());
        assert!(parse("delete edge --property K=V").is_err());
    }

    #[test]
    fn parse_create_edge_positionals_and_direction() {
        let cmd = parse("create edge --id=e --undirected --property W=1 a b").expect("parse");
        let Command::CreateEdge {
            id,
            source,
            target,
            directed,
            properties,
        } = cmd
        else {
            unreachable!("wrong variant");
        };
        assert_eq!((id.as_str(), source.as_str(), target.as_str()), ("e", "a", "b"));
        assert!(!directed);
        assert_eq!(properties.get("W").map(String::as_str), Some("1"));
    }

    #[test]
    fn parse_create_edge_defaults_to_directed() {
        let cmd = parse("create edge --id=e a b").expect("parse");
        assert!(matches!(cmd, Command::CreateEdge { directed: true, .. }));
    }

    #[test]
    fn parse_create_edge_ignores_unknown_flags() {
        let cmd = parse("create edge --id=e --verbose a b").expect("parse");
        let Command::CreateEdge { source, target, .. } = cmd else {
            unreachable!("wrong variant");
        };
        assert_eq!((source.as_str(), target.as_str()), ("a", "b"));
    }

    #[test]
    fn parse_edit_without_properties_fails() {
        assert!(parse("edit node --id=a").is_err());
    }

    #[test]
    fn parse_bad_property_fails() {
        assert!(parse("create node --id=a --property NoEquals").is_err());
        assert!(parse("create node --id=a --property =v").is_err());
    }

    #[test]
    fn parse_filter_joins_tokens() {
        let cmd = parse("filter Age >= 30").expect("parse");
        assert_eq!(cmd, Command::Filter { query: "Age >= 30".into() });
        let quoted = parse("filter 'Age >= 30'").expect("parse");
        assert_eq!(quoted, Command::Filter { query: "Age >= 30".into() });
    }

    #[test]
    fn parse_unknown_verbs_and_targets() {
        assert!(parse("frobnicate").is_err());
        assert!(parse("list everything").is_err());
        assert!(parse("create widget --id=a").is_err());
        assert!(parse("info graph").is_err());
    }

    // --- processing ---

    #[test]
    fn mutations_are_undoable_in_order() {
        let mut p = CommandProcessor::new();
        let mut g = Graph::new("g");

        assert!(p.process("create node --id=a", &mut g).success);
        assert!(p.process("create node --id=b", &mut g).success);
        assert!(p.process("create edge --id=e a b", &mut g).success);
        assert_eq!(p.undo_depth(), 3);

        assert!(p.process("undo", &mut g).success);
        assert!(!g.contains_edge("e"));
        assert!(p.process("undo", &mut g).success);
        assert!(!g.contains_node("b"));
        assert!(p.process("undo", &mut g).success);
        assert_eq!(g.node_count(), 0);
        assert!(!p.process("undo", &mut g).success);
    }

    #[test]
    fn failed_commands_do_not_push_undo() {
        let mut p = CommandProcessor::new();
        let mut g = graph_with(&["a"]);

        assert!(!p.process("create node --id=a", &mut g).success);
        assert!(!p.process("delete node --id=ghost", &mut g).success);
        assert!(!p.process("definitely not a command", &mut g).success);
        assert!(!p.process("   # comment only", &mut g).success);
        assert_eq!(p.undo_depth(), 0);
    }

    #[test]
    fn query_swaps_graph_and_is_undoable() {
        let mut p = CommandProcessor::new();
        let mut g = Graph::new("g");
        for (id, age) in [("a", "20"), ("b", "40")] {
            g.add_node(Node::new(id).with_attribute("Age", AttrValue::from(age)))
                .expect("add");
        }

        let result = p.process("filter Age >= 30", &mut g);
        assert!(result.success);
        assert_eq!(g.node_count(), 1);
        assert!(result.message.contains("1 node(s)"));

        assert!(p.process("undo", &mut g).success);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn failed_query_leaves_graph_and_stack_alone() {
        let mut p = CommandProcessor::new();
        let mut g = graph_with(&["a"]);
        let result = p.process("filter", &mut g);
        assert!(!result.success);
        assert!(result.message.starts_with("Filter error:"));
        assert_eq!(p.undo_depth(), 0);
        assert!(g.contains_node("a"));
    }

    #[test]
    fn inspection_commands_do_not_touch_the_stack() {
        let mut p = CommandProcessor::new();
        let mut g = graph_with(&["a"]);
        assert!(p.process("list", &mut g).success);
        assert!(p.process("info", &mut g).success);
        assert!(p.process("help", &mut g).success);
        assert_eq!(p.undo_depth(), 0);
    }

    #[test]
    fn reset_is_a_sentinel_for_the_host() {
        let mut p = CommandProcessor::new();
        let mut g = graph_with(&["a"]);
        let result = p.process("reset", &mut g);
        assert!(result.success);
        assert_eq!(result.action, Some(CommandAction::Reset));
        // The processor itself leaves the graph alone.
        assert!(g.contains_node("a"));
    }

    #[test]
    fn undo_stack_is_bounded() {
        let mut p = CommandProcessor::with_undo_depth(3);
        let mut g = Graph::new("g");
        for i in 0..5 {
            assert!(p.process(&format!("create node --id=n{i}"), &mut g).success);
        }
        assert_eq!(p.undo_depth(), 3);
        // Three undos rewind to the oldest retained snapshot (2 nodes).
        for _ in 0..3 {
            assert!(p.process("undo", &mut g).success);
        }
        assert_eq!(g.node_count(), 2);
        assert!(!p.process("undo", &mut g).success);
    }

    #[test]
    fn clear_is_undoable() {
        let mut p = CommandProcessor::new();
        let mut g = graph_with(&["a", "b"]);
        assert!(p.process("clear", &mut g).success);
        assert_eq!(g.node_count(), 0);
        assert!(p.process("undo", &mut g).success);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn quoted_property_values_keep_spaces() {
        let mut p = CommandProcessor::new();
        let mut g = Graph::new("g");
        assert!(
            p.process("create node --id=a --property Name='Alice Smith'", &mut g)
                .success
        );
        assert_eq!(
            g.node("a").expect("node").attributes().get("Name"),
            Some(&AttrValue::Str("Alice Smith".into()))
        );
    }
}
