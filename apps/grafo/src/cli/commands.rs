//! CLI command implementations.
//!
//! Each `cmd_*` function builds a platform, wires the built-in
//! plugins, and drives the engine. All terminal I/O lives here.

use crate::plugins::{JsonDataSource, OutlineVisualizer};
use grafo_core::command::processor::CommandProcessor;
use grafo_core::command::CommandAction;
use grafo_core::config::PlatformConfig;
use grafo_core::graph::Graph;
use grafo_core::platform::GraphPlatform;
use grafo_core::types::GraphError;
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

// =============================================================================
// SETUP
// =============================================================================

/// Load configuration. An explicit path must exist and parse; with no
/// path, `grafo.toml` in the working directory is used when present,
/// defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<PlatformConfig, GraphError> {
    let contents = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("cannot read '{}': {e}", path.display())))?,
        None => match fs::read_to_string("grafo.toml") {
            Ok(contents) => contents,
            Err(_) => return Ok(PlatformConfig::default()),
        },
    };
    toml::from_str(&contents).map_err(|e| GraphError::Config(e.to_string()))
}

/// A platform with the built-in plugins registered.
#[must_use]
pub fn build_platform(config: PlatformConfig) -> GraphPlatform {
    let mut platform = GraphPlatform::new(config);
    platform.register_data_source(Box::new(JsonDataSource));
    platform.register_visualizer(Box::new(OutlineVisualizer));
    platform
}

/// Open a workspace: load `file` through the chosen data source, or
/// start from an empty scratch graph.
fn open_workspace(
    platform: &mut GraphPlatform,
    file: Option<&Path>,
    source: Option<&str>,
) -> Result<String, GraphError> {
    match file {
        Some(path) => {
            let source = source
                .map(str::to_string)
                .or_else(|| platform.config().default_data_source.clone())
                .unwrap_or_else(|| "json".to_string());
            platform.load_graph(&source, &path.to_string_lossy(), None)
        }
        None => Ok(platform.create_workspace(Graph::new("scratch"), "none", "", Some("scratch"))),
    }
}

// =============================================================================
// SHELL
// =============================================================================

/// Interactive REPL: one command per line, `exit`/`quit` to leave.
pub fn cmd_shell(
    config: &PlatformConfig,
    file: Option<&Path>,
    source: Option<&str>,
    quiet: bool,
) -> Result<(), GraphError> {
    let mut platform = build_platform(config.clone());
    let workspace_id = open_workspace(&mut platform, file, source)?;
    let mut processor = CommandProcessor::with_undo_depth(config.max_undo_depth);

    if !quiet {
        let summary = platform
            .workspace(&workspace_id)
            .map(|ws| (ws.current_graph().node_count(), ws.current_graph().edge_count()))
            .unwrap_or_default();
        println!(
            "Loaded {} node(s), {} edge(s). Type 'help' for commands, 'exit' to leave.",
            summary.0, summary.1
        );
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();
    loop {
        if !quiet {
            print!("grafo> ");
            io::stdout().flush()?;
        }
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        println!("{}", dispatch_line(&mut platform, &workspace_id, &mut processor, trimmed)?);
    }
    Ok(())
}

/// Feed one line through the processor against the workspace's current
/// graph, honouring the reset sentinel.
fn dispatch_line(
    platform: &mut GraphPlatform,
    workspace_id: &str,
    processor: &mut CommandProcessor,
    line: &str,
) -> Result<String, GraphError> {
    let workspace = platform
        .workspace_mut(workspace_id)
        .ok_or_else(|| GraphError::WorkspaceNotFound(workspace_id.to_string()))?;
    let result = processor.process(line, workspace.current_graph_mut());
    if result.action == Some(CommandAction::Reset) {
        let restored = workspace.reset();
        return Ok(format!(
            "Workspace reset: {} node(s), {} edge(s).",
            restored.node_count(),
            restored.edge_count()
        ));
    }
    Ok(result.message)
}

// =============================================================================
// SCRIPT RUNNER
// =============================================================================

/// Execute a script file line by line, continuing past failures, and
/// report a pass/fail tally.
pub fn cmd_run(
    config: &PlatformConfig,
    script: &Path,
    file: Option<&Path>,
    source: Option<&str>,
) -> Result<(), GraphError> {
    let contents = fs::read_to_string(script)
        .map_err(|e| GraphError::Config(format!("cannot read script '{}': {e}", script.display())))?;

    let mut platform = build_platform(config.clone());
    let workspace_id = open_workspace(&mut platform, file, source)?;
    let mut processor = CommandProcessor::with_undo_depth(config.max_undo_depth);

    let mut executed = 0usize;
    let mut failed = 0usize;
    for (number, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        // Blank and comment-only lines are script formatting, not commands.
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        executed += 1;
        let workspace = platform
            .workspace_mut(&workspace_id)
            .ok_or_else(|| GraphError::WorkspaceNotFound(workspace_id.clone()))?;
        let result = processor.process(line, workspace.current_graph_mut());
        if result.action == Some(CommandAction::Reset) {
            workspace.reset();
        }
        if result.success {
            tracing::debug!(line = number + 1, "ok: {}", result.message);
        } else {
            failed += 1;
            eprintln!("line {}: {}", number + 1, result.message);
        }
    }

    let workspace = platform
        .workspace(&workspace_id)
        .ok_or_else(|| GraphError::WorkspaceNotFound(workspace_id.clone()))?;
    println!(
        "Script finished: {} command(s), {} failed. Graph: {} node(s), {} edge(s).",
        executed,
        failed,
        workspace.current_graph().node_count(),
        workspace.current_graph().edge_count()
    );
    Ok(())
}

// =============================================================================
// INSPECT / RENDER / PLUGINS
// =============================================================================

#[derive(Debug, Serialize)]
struct InspectReport {
    graph_id: String,
    nodes: usize,
    edges: usize,
    has_cycle: bool,
    data_source: String,
    file_path: String,
}

/// Load a graph and print a structural summary.
pub fn cmd_inspect(
    config: &PlatformConfig,
    file: &Path,
    source: Option<&str>,
    json_mode: bool,
) -> Result<(), GraphError> {
    let mut platform = build_platform(config.clone());
    let workspace_id = open_workspace(&mut platform, Some(file), source)?;
    let workspace = platform
        .workspace(&workspace_id)
        .ok_or_else(|| GraphError::WorkspaceNotFound(workspace_id.clone()))?;
    let graph = workspace.current_graph();

    let report = InspectReport {
        graph_id: graph.id().to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        has_cycle: graph.has_cycle(),
        data_source: workspace.data_source().to_string(),
        file_path: workspace.file_path().to_string(),
    };

    if json_mode {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| GraphError::Plugin(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!(
            "Graph '{}' (via {}): {} node(s), {} edge(s), cycle: {}.",
            report.graph_id,
            report.data_source,
            report.nodes,
            report.edges,
            if report.has_cycle { "yes" } else { "no" }
        );
    }
    Ok(())
}

/// Load a graph and render it through a visualizer plugin.
pub fn cmd_render(
    config: &PlatformConfig,
    file: &Path,
    source: Option<&str>,
    visualizer: Option<&str>,
    output: Option<&Path>,
) -> Result<(), GraphError> {
    let mut platform = build_platform(config.clone());
    let workspace_id = open_workspace(&mut platform, Some(file), source)?;
    let markup = platform.visualize(visualizer, Some(&workspace_id))?;

    match output {
        Some(path) => {
            fs::write(path, &markup)?;
            println!("Wrote {} byte(s) to {}.", markup.len(), path.display());
        }
        None => println!("{markup}"),
    }
    Ok(())
}

/// List the registered plugins.
pub fn cmd_plugins(config: &PlatformConfig, json_mode: bool) -> Result<(), GraphError> {
    let platform = build_platform(config.clone());

    if json_mode {
        #[derive(Serialize)]
        struct Registry {
            data_sources: Vec<String>,
            visualizers: Vec<String>,
        }
        let registry = Registry {
            data_sources: platform.data_source_names(),
            visualizers: platform.visualizer_names(),
        };
        let rendered = serde_json::to_string_pretty(&registry)
            .map_err(|e| GraphError::Plugin(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!("Data sources: {}", platform.data_source_names().join(", "));
        println!("Visualizers:  {}", platform.visualizer_names().join(", "));
    }
    Ok(())
}
