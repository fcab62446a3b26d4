//! Integration tests for the built-in plugins, driving them through
//! the platform the CLI builds.

use grafo::cli::build_platform;
use grafo::plugins::JsonDataSource;
use grafo_core::config::PlatformConfig;
use grafo_core::platform::DataSourcePlugin;
use grafo_core::types::{AttrValue, GraphError, ValueType};
use std::io::Write;
use tempfile::NamedTempFile;

fn fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file
}

const PEOPLE: &str = r#"{
    "id": "people",
    "nodes": [
        {"id": "alice", "attributes": {"Name": "Alice", "Age": 34, "Hired": "2019-05-01"}},
        {"id": "bob", "attributes": {"Age": 28.5, "Active": true, "Note": null}},
        {"id": "zip", "attributes": {"Code": "01234"}, "attribute_types": {"Code": "str"}}
    ],
    "edges": [
        {"id": "m1", "source": "alice", "target": "bob"},
        {"id": "peer", "source": "bob", "target": "zip", "directed": false,
         "attributes": {"Weight": 2}}
    ]
}"#;

#[test]
fn json_source_detects_types_on_load() {
    let file = fixture(PEOPLE);
    let graph = JsonDataSource
        .parse(&file.path().to_string_lossy())
        .expect("parse");

    assert_eq!(graph.id(), "people");
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);

    let alice = graph.node("alice").expect("node");
    assert_eq!(alice.attributes().get("Age"), Some(&AttrValue::Int(34)));
    assert_eq!(alice.attributes().type_of("Hired"), Some(ValueType::Date));

    let bob = graph.node("bob").expect("node");
    assert_eq!(bob.attributes().get("Age"), Some(&AttrValue::Float(28.5)));
    assert_eq!(bob.attributes().get("Active"), Some(&AttrValue::Bool(true)));
    // Null keeps the str tag.
    assert_eq!(bob.attributes().get("Note"), Some(&AttrValue::Null));
    assert_eq!(bob.attributes().type_of("Note"), Some(ValueType::Str));
}

#[test]
fn explicit_tags_beat_detection() {
    let file = fixture(PEOPLE);
    let graph = JsonDataSource
        .parse(&file.path().to_string_lossy())
        .expect("parse");

    // "01234" would detect as int; the document pins it to str.
    let zip = graph.node("zip").expect("node");
    assert_eq!(zip.attributes().get("Code"), Some(&AttrValue::Str("01234".into())));
    assert_eq!(zip.attributes().type_of("Code"), Some(ValueType::Str));
}

#[test]
fn edge_direction_defaults_to_directed() {
    let file = fixture(PEOPLE);
    let graph = JsonDataSource
        .parse(&file.path().to_string_lossy())
        .expect("parse");
    assert!(graph.edge("m1").expect("edge").is_directed());
    assert!(!graph.edge("peer").expect("edge").is_directed());
    assert_eq!(
        graph.edge("peer").expect("edge").attributes().get("Weight"),
        Some(&AttrValue::Int(2))
    );
}

#[test]
fn dangling_edge_endpoint_fails_the_load() {
    let file = fixture(
        r#"{"nodes": [{"id": "a"}],
            "edges": [{"id": "e", "source": "a", "target": "ghost"}]}"#,
    );
    let err = JsonDataSource.parse(&file.path().to_string_lossy());
    assert!(matches!(err, Err(GraphError::EndpointMissing { .. })));
}

#[test]
fn malformed_input_is_a_plugin_error() {
    let garbage = fixture("not json at all");
    assert!(matches!(
        JsonDataSource.parse(&garbage.path().to_string_lossy()),
        Err(GraphError::Plugin(_))
    ));
    assert!(matches!(
        JsonDataSource.parse("/definitely/not/there.json"),
        Err(GraphError::Plugin(_))
    ));

    let nested = fixture(r#"{"nodes": [{"id": "a", "attributes": {"Tags": [1, 2]}}]}"#);
    assert!(matches!(
        JsonDataSource.parse(&nested.path().to_string_lossy()),
        Err(GraphError::Plugin(_))
    ));
}

#[test]
fn graph_id_falls_back_to_file_stem() {
    let file = fixture(r#"{"nodes": [{"id": "a"}]}"#);
    let graph = JsonDataSource
        .parse(&file.path().to_string_lossy())
        .expect("parse");
    let stem = file
        .path()
        .file_stem()
        .expect("stem")
        .to_string_lossy()
        .into_owned();
    assert_eq!(graph.id(), stem);
}

#[test]
fn platform_load_filter_and_render_end_to_end() {
    let file = fixture(PEOPLE);
    let mut platform = build_platform(PlatformConfig::default());

    let workspace_id = platform
        .load_graph("json", &file.path().to_string_lossy(), Some("demo"))
        .expect("load");
    assert_eq!(
        platform.workspace(&workspace_id).expect("workspace").name(),
        "demo"
    );

    let filtered = platform.filter_graph("Age >= 30", None).expect("filter");
    assert_eq!(filtered.node_count(), 1);

    let markup = platform.visualize(None, None).expect("visualize");
    assert!(markup.contains("<h2>Graph people_sub</h2>"));
    assert!(markup.contains("<strong>alice</strong>"));
    assert!(!markup.contains("<strong>bob</strong>"));

    platform.reset_workspace(None).expect("reset");
    let markup = platform.visualize(Some("outline"), None).expect("visualize");
    assert!(markup.contains("3 node(s), 2 edge(s)"));
}
