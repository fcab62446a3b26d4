//! Outline visualizer plugin.
//!
//! Renders a graph as a nested HTML list: one entry per node with its
//! typed attributes, then one entry per edge with its endpoints and
//! direction. Deterministic output (nodes and edges in id order), so
//! snapshots of the markup are stable.

use grafo_core::graph::Graph;
use grafo_core::platform::VisualizerPlugin;
use grafo_core::types::GraphError;
use std::fmt::Write as _;

/// Visualizer producing a plain HTML outline.
#[derive(Debug, Default)]
pub struct OutlineVisualizer;

impl VisualizerPlugin for OutlineVisualizer {
    fn name(&self) -> &str {
        "outline"
    }

    fn visualize(&self, graph: &Graph) -> Result<String, GraphError> {
        let mut out = String::new();
        let _ = writeln!(out, "<div class=\"graph-outline\">");
        let _ = writeln!(out, "  <h2>Graph {}</h2>", escape(graph.id()));
        let _ = writeln!(
            out,
            "  <p>{} node(s), {} edge(s)</p>",
            graph.node_count(),
            graph.edge_count()
        );

        let _ = writeln!(out, "  <ul class=\"nodes\">");
        for node in graph.nodes() {
            let _ = writeln!(out, "    <li><strong>{}</strong>", escape(node.id()));
            if !node.attributes().is_empty() {
                let _ = writeln!(out, "      <ul>");
                for (key, value) in node.attributes().iter() {
                    let tag = node.attributes().type_of(key).map_or("?", |t| t.as_str());
                    let _ = writeln!(
                        out,
                        "        <li>{}: {} <em>({tag})</em></li>",
                        escape(key),
                        escape(&value.to_string())
                    );
                }
                let _ = writeln!(out, "      </ul>");
            }
            let _ = writeln!(out, "    </li>");
        }
        let _ = writeln!(out, "  </ul>");

        let _ = writeln!(out, "  <ul class=\"edges\">");
        for edge in graph.edges() {
            let arrow = if edge.is_directed() { "&rarr;" } else { "&harr;" };
            let _ = writeln!(
                out,
                "    <li>{}: {} {arrow} {}</li>",
                escape(edge.id()),
                escape(edge.source()),
                escape(edge.target())
            );
        }
        let _ = writeln!(out, "  </ul>");
        let _ = writeln!(out, "</div>");
        Ok(out)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafo_core::graph::{Edge, EdgeDirection, Node};
    use grafo_core::types::AttrValue;

    #[test]
    fn renders_nodes_edges_and_escapes() {
        let mut g = Graph::new("demo");
        g.add_node(Node::new("a<b").with_attribute("Name", AttrValue::from("x & y")))
            .expect("add");
        g.add_node(Node::new("c")).expect("add");
        g.add_edge(Edge::new("e", "a<b", "c", EdgeDirection::Undirected))
            .expect("add");

        let html = OutlineVisualizer.visualize(&g).expect("visualize");
        assert!(html.contains("<h2>Graph demo</h2>"));
        assert!(html.contains("a&lt;b"));
        assert!(html.contains("x &amp; y <em>(str)</em>"));
        assert!(html.contains("&harr;"));
        assert!(!html.contains("a<b"));
    }
}
