//! # Query Engine
//!
//! Filter and search over a graph's nodes. Both queries follow the
//! same template: parse the query, collect matching node ids, and
//! return the induced subgraph (see [`Graph::subgraph`]). The input
//! graph is never modified.
//!
//! Filtering is typed: the literal is converted to each node's stored
//! attribute type before comparison, and an inconvertible literal
//! aborts the whole query on the first offending node. Search is
//! untyped substring matching over rendered values or attribute names.

use crate::graph::{Graph, Node};
use crate::types::{AttrValue, ComparisonOp, GraphError};
use std::collections::BTreeSet;

// =============================================================================
// FILTER
// =============================================================================

/// A parsed filter expression: `attribute op literal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    pub attribute: String,
    pub op: ComparisonOp,
    pub value: String,
}

impl FilterExpr {
    /// Parse a filter query string.
    ///
    /// Grammar: an attribute name (word characters), an operator
    /// (`==`, `!=`, `>=`, `<=`, `>`, `<` — longest match, so `>=` is
    /// never read as `>` then `=`, and runs like `>>` or `><` are
    /// rejected), and a non-empty literal. Whitespace around the three
    /// parts is ignored; the literal may itself contain spaces.
    pub fn parse(query: &str) -> Result<Self, GraphError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GraphError::FilterParse("filter query cannot be empty".into()));
        }

        let invalid = || {
            GraphError::FilterParse(format!(
                "expected '<attribute> <operator> <value>', got '{query}'"
            ))
        };

        let attr_len = query
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(query.len(), |(i, _)| i);
        if attr_len == 0 {
            return Err(invalid());
        }
        let attribute = query[..attr_len].to_string();
        let rest = query[attr_len..].trim_start();

        let (op, op_len) = parse_operator(rest).ok_or_else(invalid)?;

        let value = rest[op_len..].trim();
        if value.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            attribute,
            op,
            value: value.to_string(),
        })
    }
}

/// Longest-match operator at the head of `rest`. A bare `>` or `<`
/// followed by another operator character is malformed, not a
/// one-character operator with a strange literal.
fn parse_operator(rest: &str) -> Option<(ComparisonOp, usize)> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    let second = chars.next();

    if let Some(two) = rest.get(..2) {
        if let Some(op) = ComparisonOp::from_symbol(two) {
            return Some((op, 2));
        }
    }
    match first {
        '>' | '<' => {
            if matches!(second, Some('>' | '<' | '=' | '!')) {
                return None;
            }
            ComparisonOp::from_symbol(&rest[..1]).map(|op| (op, 1))
        }
        _ => None,
    }
}

/// Apply a filter query, returning the subgraph of matching nodes.
///
/// A node matches when it has the attribute and the typed comparison
/// holds. Nodes lacking the attribute never match and never error. A
/// literal that cannot be converted to some node's stored type fails
/// the whole query with [`GraphError::FilterType`].
pub fn filter(graph: &Graph, query: &str) -> Result<Graph, GraphError> {
    let expr = FilterExpr::parse(query)?;
    let mut matching = BTreeSet::new();
    for node in graph.nodes() {
        if node_matches(node, &expr)? {
            matching.insert(node.id().to_string());
        }
    }
    Ok(graph.subgraph(&matching))
}

fn node_matches(node: &Node, expr: &FilterExpr) -> Result<bool, GraphError> {
    let Some(tag) = node.attributes().type_of(&expr.attribute) else {
        return Ok(false);
    };
    let Some(stored) = node.attributes().get(&expr.attribute) else {
        return Ok(false);
    };
    // Convert the literal to the node's stored type, not the reverse:
    // the stored tag is authoritative.
    let literal = AttrValue::Str(expr.value.clone())
        .convert_to(tag)
        .map_err(|_| GraphError::FilterType(expr.attribute.clone()))?;
    stored
        .compare(&literal, expr.op)
        .map_err(|_| GraphError::FilterType(expr.attribute.clone()))
}

// =============================================================================
// SEARCH
// =============================================================================

/// Apply a search query, returning the subgraph of matching nodes.
///
/// Two modes, selected by shape:
///
/// - `name=value` (name is word characters, value non-empty): matches
///   nodes whose attribute named exactly `name` (case-insensitive) has
///   a rendered value containing `value` (case-insensitive). Null
///   values never match.
/// - anything else: a bare token matched case-insensitively as a
///   substring of attribute *names*; values are not inspected.
pub fn search(graph: &Graph, query: &str) -> Result<Graph, GraphError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(GraphError::SearchParse("search query cannot be empty".into()));
    }

    let matching = match split_name_value(query) {
        Some((name, value)) => find_by_value(graph, name, value),
        None => find_by_name(graph, query),
    };
    Ok(graph.subgraph(&matching))
}

/// Recognise the `name=value` form. The name must be entirely word
/// characters and the value non-empty; otherwise the whole query is
/// treated as a bare name token. The value is taken verbatim, so
/// leading whitespace after `=` is part of the substring to match.
fn split_name_value(query: &str) -> Option<(&str, &str)> {
    let (name, value) = query.split_once('=')?;
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}

fn find_by_value(graph: &Graph, name: &str, value: &str) -> BTreeSet<String> {
    let name_lower = name.to_lowercase();
    let value_lower = value.to_lowercase();
    let mut matching = BTreeSet::new();
    for node in graph.nodes() {
        for (key, stored) in node.attributes().iter() {
            if key.to_lowercase() != name_lower || stored.is_null() {
                continue;
            }
            if stored.to_string().to_lowercase().contains(&value_lower) {
                matching.insert(node.id().to_string());
                break;
            }
        }
    }
    matching
}

fn find_by_name(graph: &Graph, token: &str) -> BTreeSet<String> {
    let token_lower = token.to_lowercase();
    let mut matching = BTreeSet::new();
    for node in graph.nodes() {
        if node
            .attributes()
            .keys()
            .any(|key| key.to_lowercase().contains(&token_lower))
        {
            matching.insert(node.id().to_string());
        }
    }
    matching
}

// =============================================================================
// TESTS
// =============================================================================
