//! JSON data-source plugin.
//!
//! Reads a flat document with `nodes` and `edges` arrays:
//!
//! ```json
//! {
//!   "id": "people",
//!   "nodes": [
//!     {"id": "alice", "attributes": {"Age": 34, "Name": "Alice"}},
//!     {"id": "zip",   "attributes": {"Code": "01234"},
//!      "attribute_types": {"Code": "str"}}
//!   ],
//!   "edges": [
//!     {"id": "e1", "source": "alice", "target": "zip", "directed": true}
//!   ]
//! }
//! ```
//!
//! Scalar attribute values are type-detected on load (strings probe
//! int → float → ISO date → str). An entry in `attribute_types` pins
//! the tag explicitly and wins over detection, so a numeric string
//! stored as `"str"` stays a string.

use grafo_core::graph::{Edge, EdgeDirection, Graph, Node};
use grafo_core::platform::DataSourcePlugin;
use grafo_core::types::{AttrValue, Attributes, GraphError, ValueType};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Document {
    id: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeDoc>,
    #[serde(default)]
    edges: Vec<EdgeDoc>,
}

#[derive(Debug, Deserialize)]
struct NodeDoc {
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    attribute_types: BTreeMap<String, ValueType>,
}

#[derive(Debug, Deserialize)]
struct EdgeDoc {
    id: String,
    source: String,
    target: String,
    #[serde(default = "default_directed")]
    directed: bool,
    #[serde(default)]
    attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    attribute_types: BTreeMap<String, ValueType>,
}

const fn default_directed() -> bool {
    true
}

/// Data source for flat JSON graph documents.
#[derive(Debug, Default)]
pub struct JsonDataSource;

impl DataSourcePlugin for JsonDataSource {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, source: &str) -> Result<Graph, GraphError> {
        let contents = fs::read_to_string(source)
            .map_err(|e| GraphError::Plugin(format!("cannot read '{source}': {e}")))?;
        let document: Document = serde_json::from_str(&contents)
            .map_err(|e| GraphError::Plugin(format!("invalid JSON in '{source}': {e}")))?;

        let graph_id = document
            .id
            .or_else(|| {
                Path::new(source)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "graph".to_string());

        let mut graph = Graph::new(graph_id);
        for node_doc in document.nodes {
            let mut node = Node::new(node_doc.id);
            apply_attributes(node.attributes_mut(), &node_doc.attributes, &node_doc.attribute_types)?;
            graph.add_node(node)?;
        }
        for edge_doc in document.edges {
            let direction = if edge_doc.directed {
                EdgeDirection::Directed
            } else {
                EdgeDirection::Undirected
            };
            let mut edge = Edge::new(edge_doc.id, edge_doc.source, edge_doc.target, direction);
            apply_attributes(edge.attributes_mut(), &edge_doc.attributes, &edge_doc.attribute_types)?;
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}

fn apply_attributes(
    attrs: &mut Attributes,
    values: &BTreeMap<String, serde_json::Value>,
    tags: &BTreeMap<String, ValueType>,
) -> Result<(), GraphError> {
    for (key, raw) in values {
        let value = scalar_value(key, raw)?;
        match tags.get(key) {
            Some(tag) => attrs.set_typed(key.clone(), value, *tag)?,
            None => attrs.set(key.clone(), value),
        }
    }
    Ok(())
}

/// Map a JSON scalar to an attribute value. Arrays and objects are not
/// attribute material.
fn scalar_value(key: &str, raw: &serde_json::Value) -> Result<AttrValue, GraphError> {
    match raw {
        serde_json::Value::Null => Ok(AttrValue::Null),
        serde_json::Value::Bool(b) => Ok(AttrValue::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttrValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(AttrValue::Float(f))
            } else {
                Err(GraphError::Plugin(format!(
                    "attribute '{key}': number {n} out of range"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(AttrValue::Str(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(GraphError::Plugin(
            format!("attribute '{key}': only scalar values are supported"),
        )),
    }
}
