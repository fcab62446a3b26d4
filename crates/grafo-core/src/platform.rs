//! # Platform Context
//!
//! The top-level coordination object a host embeds: plugin registries,
//! the workspace table with an active-workspace pointer, and observer
//! callbacks for lifecycle events.
//!
//! The platform is an explicitly constructed value, not a process
//! singleton; a host (or a test) can hold several side by side.
//! Plugins are registered statically by the host at startup. Observer
//! callbacks run synchronously and best-effort: a failing callback is
//! logged and skipped, it never fails the operation that fired it.

use crate::config::PlatformConfig;
use crate::graph::Graph;
use crate::types::GraphError;
use crate::workspace::{Workspace, WorkspaceSummary};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// PLUGIN CONTRACTS
// =============================================================================

/// Parses an external representation into a [`Graph`].
///
/// `source` is an opaque locator the plugin understands (typically a
/// file path); the engine never touches it itself.
pub trait DataSourcePlugin: Send {
    /// Registry name, unique per platform.
    fn name(&self) -> &str;

    /// Parse `source` into a graph.
    fn parse(&self, source: &str) -> Result<Graph, GraphError>;
}

/// Renders a [`Graph`] into display markup.
pub trait VisualizerPlugin: Send {
    /// Registry name, unique per platform.
    fn name(&self) -> &str;

    /// Render the graph.
    fn visualize(&self, graph: &Graph) -> Result<String, GraphError>;
}

// =============================================================================
// EVENTS
// =============================================================================

/// Event categories a callback can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    WorkspaceCreated,
    WorkspaceSwitched,
    WorkspaceRemoved,
    GraphUpdated,
    NodeSelected,
}

/// A lifecycle notification delivered to subscribed callbacks.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    WorkspaceCreated { workspace_id: String },
    WorkspaceSwitched { workspace_id: String },
    WorkspaceRemoved { workspace_id: String },
    GraphUpdated { workspace_id: String, nodes: usize, edges: usize },
    NodeSelected { workspace_id: String, node_id: String },
}

impl PlatformEvent {
    /// The subscription category this event belongs to.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WorkspaceCreated { .. } => EventKind::WorkspaceCreated,
            Self::WorkspaceSwitched { .. } => EventKind::WorkspaceSwitched,
            Self::WorkspaceRemoved { .. } => EventKind::WorkspaceRemoved,
            Self::GraphUpdated { .. } => EventKind::GraphUpdated,
            Self::NodeSelected { .. } => EventKind::NodeSelected,
        }
    }
}

type EventCallback = Box<dyn Fn(&PlatformEvent) -> Result<(), GraphError> + Send>;

// =============================================================================
// PLATFORM
// =============================================================================

/// Plugin registries + workspaces + observers.
pub struct GraphPlatform {
    config: PlatformConfig,
    data_sources: BTreeMap<String, Box<dyn DataSourcePlugin>>,
    visualizers: BTreeMap<String, Box<dyn VisualizerPlugin>>,
    workspaces: BTreeMap<String, Workspace>,
    active: Option<String>,
    listeners: BTreeMap<EventKind, Vec<EventCallback>>,
}

impl Default for GraphPlatform {
    fn default() -> Self {
        Self::new(PlatformConfig::default())
    }
}

impl fmt::Debug for GraphPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphPlatform")
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("visualizers", &self.visualizers.keys().collect::<Vec<_>>())
            .field("workspaces", &self.workspaces.len())
            .field("active", &self.active)
            .finish()
    }
}

impl GraphPlatform {
    /// Create a platform with the given configuration and empty
    /// registries.
    #[must_use]
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            data_sources: BTreeMap::new(),
            visualizers: BTreeMap::new(),
            workspaces: BTreeMap::new(),
            active: None,
            listeners: BTreeMap::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Plugin registry
    // -------------------------------------------------------------------------

    /// Register a data-source plugin under its own name. Re-registering
    /// a name replaces the previous plugin.
    pub fn register_data_source(&mut self, plugin: Box<dyn DataSourcePlugin>) {
        let name = plugin.name().to_string();
        tracing::info!(plugin = %name, "data source registered");
        self.data_sources.insert(name, plugin);
    }

    /// Register a visualizer plugin under its own name.
    pub fn register_visualizer(&mut self, plugin: Box<dyn VisualizerPlugin>) {
        let name = plugin.name().to_string();
        tracing::info!(plugin = %name, "visualizer registered");
        self.visualizers.insert(name, plugin);
    }

    /// Registered data-source names, sorted.
    #[must_use]
    pub fn data_source_names(&self) -> Vec<String> {
        self.data_sources.keys().cloned().collect()
    }

    /// Registered visualizer names, sorted.
    #[must_use]
    pub fn visualizer_names(&self) -> Vec<String> {
        self.visualizers.keys().cloned().collect()
    }

    /// Look up a data-source plugin.
    #[must_use]
    pub fn data_source(&self, name: &str) -> Option<&dyn DataSourcePlugin> {
        self.data_sources.get(name).map(Box::as_ref)
    }

    /// Look up a visualizer plugin.
    #[must_use]
    pub fn visualizer(&self, name: &str) -> Option<&dyn VisualizerPlugin> {
        self.visualizers.get(name).map(Box::as_ref)
    }

    // -------------------------------------------------------------------------
    // Workspace lifecycle
    // -------------------------------------------------------------------------

    /// Load a graph through a registered data source and open a
    /// workspace around it. The new workspace becomes active; its id
    /// is returned.
    pub fn load_graph(
        &mut self,
        plugin_name: &str,
        source: &str,
        workspace_name: Option<&str>,
    ) -> Result<String, GraphError> {
        let plugin = self
            .data_sources
            .get(plugin_name)
            .ok_or_else(|| GraphError::PluginNotFound {
                kind: "data source",
                name: plugin_name.to_string(),
            })?;
        let graph = plugin.parse(source)?;
        tracing::info!(
            plugin = plugin_name,
            source,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(self.create_workspace(graph, plugin_name, source, workspace_name))
    }

    /// Open a workspace around an already-built graph. The new
    /// workspace becomes active; its id is returned.
    pub fn create_workspace(
        &mut self,
        graph: Graph,
        data_source: &str,
        file_path: &str,
        name: Option<&str>,
    ) -> String {
        let mut workspace = Workspace::with_history_depth(graph, self.config.max_history_depth)
            .with_source(data_source, file_path);
        if let Some(name) = name {
            workspace = workspace.with_name(name);
        }
        let id = workspace.id().to_string();
        self.workspaces.insert(id.clone(), workspace);
        self.active = Some(id.clone());
        self.notify(&PlatformEvent::WorkspaceCreated {
            workspace_id: id.clone(),
        });
        id
    }

    /// Look up a workspace by id.
    #[must_use]
    pub fn workspace(&self, workspace_id: &str) -> Option<&Workspace> {
        self.workspaces.get(workspace_id)
    }

    /// Look up a workspace for mutation.
    pub fn workspace_mut(&mut self, workspace_id: &str) -> Option<&mut Workspace> {
        self.workspaces.get_mut(workspace_id)
    }

    /// The active workspace, if any.
    #[must_use]
    pub fn active_workspace(&self) -> Option<&Workspace> {
        self.active.as_deref().and_then(|id| self.workspaces.get(id))
    }

    /// The active workspace for mutation, if any.
    pub fn active_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let id = self.active.clone()?;
        self.workspaces.get_mut(&id)
    }

    /// Make a workspace active.
    pub fn set_active_workspace(&mut self, workspace_id: &str) -> Result<(), GraphError> {
        if !self.workspaces.contains_key(workspace_id) {
            return Err(GraphError::WorkspaceNotFound(workspace_id.to_string()));
        }
        self.active = Some(workspace_id.to_string());
        self.notify(&PlatformEvent::WorkspaceSwitched {
            workspace_id: workspace_id.to_string(),
        });
        Ok(())
    }

    /// Close a workspace. Closing an unknown id is a no-op. If the
    /// active workspace is closed, the first remaining one (by id)
    /// becomes active.
    pub fn remove_workspace(&mut self, workspace_id: &str) {
        if self.workspaces.remove(workspace_id).is_none() {
            return;
        }
        if self.active.as_deref() == Some(workspace_id) {
            self.active = self.workspaces.keys().next().cloned();
        }
        self.notify(&PlatformEvent::WorkspaceRemoved {
            workspace_id: workspace_id.to_string(),
        });
    }

    /// Summaries of every open workspace, in id order.
    #[must_use]
    pub fn workspace_summaries(&self) -> Vec<WorkspaceSummary> {
        self.workspaces.values().map(Workspace::summary).collect()
    }

    // -------------------------------------------------------------------------
    // Delegated graph operations
    // -------------------------------------------------------------------------

    /// Filter the given (or active) workspace's view.
    pub fn filter_graph(
        &mut self,
        query: &str,
        workspace_id: Option<&str>,
    ) -> Result<&Graph, GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let (nodes, edges) = {
            let workspace = self.require_workspace_mut(&id)?;
            let graph = workspace.apply_filter(query)?;
            (graph.node_count(), graph.edge_count())
        };
        self.notify(&PlatformEvent::GraphUpdated {
            workspace_id: id.clone(),
            nodes,
            edges,
        });
        Ok(self.require_workspace(&id)?.current_graph())
    }

    /// Search the given (or active) workspace's view.
    pub fn search_graph(
        &mut self,
        query: &str,
        workspace_id: Option<&str>,
    ) -> Result<&Graph, GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let (nodes, edges) = {
            let workspace = self.require_workspace_mut(&id)?;
            let graph = workspace.apply_search(query)?;
            (graph.node_count(), graph.edge_count())
        };
        self.notify(&PlatformEvent::GraphUpdated {
            workspace_id: id.clone(),
            nodes,
            edges,
        });
        Ok(self.require_workspace(&id)?.current_graph())
    }

    /// Undo the last transformation in the given (or active)
    /// workspace. `Ok(None)` when there is nothing to undo; no event
    /// fires in that case.
    pub fn undo(&mut self, workspace_id: Option<&str>) -> Result<Option<&Graph>, GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let restored = {
            let workspace = self.require_workspace_mut(&id)?;
            workspace.undo().map(|g| (g.node_count(), g.edge_count()))
        };
        let Some((nodes, edges)) = restored else {
            return Ok(None);
        };
        self.notify(&PlatformEvent::GraphUpdated {
            workspace_id: id.clone(),
            nodes,
            edges,
        });
        Ok(Some(self.require_workspace(&id)?.current_graph()))
    }

    /// Restore the given (or active) workspace to its original graph.
    pub fn reset_workspace(
        &mut self,
        workspace_id: Option<&str>,
    ) -> Result<&Graph, GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let (nodes, edges) = {
            let workspace = self.require_workspace_mut(&id)?;
            let graph = workspace.reset();
            (graph.node_count(), graph.edge_count())
        };
        self.notify(&PlatformEvent::GraphUpdated {
            workspace_id: id.clone(),
            nodes,
            edges,
        });
        Ok(self.require_workspace(&id)?.current_graph())
    }

    /// Render the given (or active) workspace's current view through a
    /// visualizer. With no name given, the configured default is used,
    /// then the first registered visualizer.
    pub fn visualize(
        &self,
        visualizer_name: Option<&str>,
        workspace_id: Option<&str>,
    ) -> Result<String, GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let name = visualizer_name
            .map(str::to_string)
            .or_else(|| self.config.default_visualizer.clone())
            .or_else(|| self.visualizers.keys().next().cloned())
            .ok_or_else(|| GraphError::Plugin("no visualizer plugins registered".into()))?;
        let plugin = self
            .visualizers
            .get(&name)
            .ok_or_else(|| GraphError::PluginNotFound {
                kind: "visualizer",
                name,
            })?;
        plugin.visualize(self.require_workspace(&id)?.current_graph())
    }

    /// Report a node selection to observers. The node must exist in
    /// the workspace's current view.
    pub fn select_node(
        &self,
        node_id: &str,
        workspace_id: Option<&str>,
    ) -> Result<(), GraphError> {
        let id = self.resolve_workspace_id(workspace_id)?;
        let workspace = self.require_workspace(&id)?;
        if !workspace.current_graph().contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id.to_string()));
        }
        self.notify(&PlatformEvent::NodeSelected {
            workspace_id: id,
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    /// Subscribe a callback to one event kind. Callbacks run
    /// synchronously in registration order.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&PlatformEvent) -> Result<(), GraphError> + Send + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    fn notify(&self, event: &PlatformEvent) {
        let Some(callbacks) = self.listeners.get(&event.kind()) else {
            return;
        };
        for callback in callbacks {
            if let Err(e) = callback(event) {
                tracing::warn!(event = ?event.kind(), error = %e, "observer callback failed");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn resolve_workspace_id(&self, workspace_id: Option<&str>) -> Result<String, GraphError> {
        let id = match workspace_id {
            Some(id) => id.to_string(),
            None => self
                .active
                .clone()
                .ok_or(GraphError::NoActiveWorkspace)?,
        };
        if !self.workspaces.contains_key(&id) {
            return Err(GraphError::WorkspaceNotFound(id));
        }
        Ok(id)
    }

    fn require_workspace(&self, id: &str) -> Result<&Workspace, GraphError> {
        self.workspaces
            .get(id)
            .ok_or_else(|| GraphError::WorkspaceNotFound(id.to_string()))
    }

    fn require_workspace_mut(&mut self, id: &str) -> Result<&mut Workspace, GraphError> {
        self.workspaces
            .get_mut(id)
            .ok_or_else(|| GraphError::WorkspaceNotFound(id.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::types::AttrValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixtureSource;

    impl DataSourcePlugin for FixtureSource {
        fn name(&self) -> &str {
            "fixture"
        }

        fn parse(&self, source: &str) -> Result<Graph, GraphError> {
            if source == "bad" {
                return Err(GraphError::Plugin("unreadable source".into()));
            }
            let mut g = Graph::new(source);
            for (id, age) in [("a", "20"), ("b", "40")] {
                let node = Node::new(id).with_attribute("Age", AttrValue::from(age));
                g.add_node(node)?;
            }
            Ok(g)
        }
    }

    struct CountingVisualizer;

    impl VisualizerPlugin for CountingVisualizer {
        fn name(&self) -> &str {
            "counting"
        }

        fn visualize(&self, graph: &Graph) -> Result<String, GraphError> {
            Ok(format!("{}/{}", graph.node_count(), graph.edge_count()))
        }
    }

    fn platform() -> GraphPlatform {
        let mut p = GraphPlatform::default();
        p.register_data_source(Box::new(FixtureSource));
        p.register_visualizer(Box::new(CountingVisualizer));
        p
    }

    #[test]
    fn load_graph_opens_an_active_workspace() {
        let mut p = platform();
        let id = p.load_graph("fixture", "demo", Some("first")).expect("load");
        let active = p.active_workspace().expect("active");
        assert_eq!(active.id(), id);
        assert_eq!(active.name(), "first");
        assert_eq!(active.data_source(), "fixture");
        assert_eq!(active.current_graph().node_count(), 2);
    }

    #[test]
    fn unknown_plugin_and_failing_parse() {
        let mut p = platform();
        assert!(matches!(
            p.load_graph("nope", "demo", None),
            Err(GraphError::PluginNotFound { .. })
        ));
        assert!(matches!(
            p.load_graph("fixture", "bad", None),
            Err(GraphError::Plugin(_))
        ));
        assert!(p.active_workspace().is_none());
    }

    #[test]
    fn operations_without_a_workspace_fail() {
        let mut p = platform();
        assert!(matches!(
            p.filter_graph("Age > 1", None),
            Err(GraphError::NoActiveWorkspace)
        ));
        assert!(matches!(
            p.filter_graph("Age > 1", Some("ghost")),
            Err(GraphError::WorkspaceNotFound(_))
        ));
    }

    #[test]
    fn filter_undo_reset_delegation() {
        let mut p = platform();
        p.load_graph("fixture", "demo", None).expect("load");

        let filtered = p.filter_graph("Age >= 30", None).expect("filter");
        assert_eq!(filtered.node_count(), 1);

        let restored = p.undo(None).expect("undo").expect("something to undo");
        assert_eq!(restored.node_count(), 2);
        assert!(p.undo(None).expect("undo").is_none());

        p.filter_graph("Age >= 30", None).expect("filter");
        let reset = p.reset_workspace(None).expect("reset");
        assert_eq!(reset.node_count(), 2);
    }

    #[test]
    fn switching_and_removing_workspaces() {
        let mut p = platform();
        let first = p.load_graph("fixture", "one", None).expect("load");
        let second = p.load_graph("fixture", "two", None).expect("load");
        assert_eq!(p.active_workspace().expect("active").id(), second);

        p.set_active_workspace(&first).expect("switch");
        assert_eq!(p.active_workspace().expect("active").id(), first);
        assert!(p.set_active_workspace("ghost").is_err());

        p.remove_workspace(&first);
        assert_eq!(p.active_workspace().expect("active").id(), second);
        p.remove_workspace(&second);
        assert!(p.active_workspace().is_none());
        // Removing an unknown id is a quiet no-op.
        p.remove_workspace("ghost");
    }

    #[test]
    fn visualize_uses_default_then_first() {
        let mut p = platform();
        p.load_graph("fixture", "demo", None).expect("load");
        assert_eq!(p.visualize(None, None).expect("visualize"), "2/0");
        assert_eq!(p.visualize(Some("counting"), None).expect("visualize"), "2/0");
        assert!(matches!(
            p.visualize(Some("ghost"), None),
            Err(GraphError::PluginNotFound { .. })
        ));
    }

    #[test]
    fn observers_fire_and_failures_are_swallowed() {
        let mut p = platform();
        let created = Arc::new(AtomicUsize::new(0));
        let updated = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&created);
        p.subscribe(EventKind::WorkspaceCreated, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let u = Arc::clone(&updated);
        p.subscribe(EventKind::GraphUpdated, move |_| {
            u.fetch_add(1, Ordering::SeqCst);
            // A failing observer must not fail the operation.
            Err(GraphError::Plugin("observer broke".into()))
        });

        p.load_graph("fixture", "demo", None).expect("load");
        assert_eq!(created.load(Ordering::SeqCst), 1);

        p.filter_graph("Age >= 30", None).expect("filter");
        assert_eq!(updated.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn select_node_validates_and_notifies() {
        let mut p = platform();
        let selected = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&selected);
        p.subscribe(EventKind::NodeSelected, move |event| {
            if let PlatformEvent::NodeSelected { node_id, .. } = event {
                assert_eq!(node_id, "a");
            }
            s.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        p.load_graph("fixture", "demo", None).expect("load");
        p.select_node("a", None).expect("select");
        assert!(matches!(
            p.select_node("ghost", None),
            Err(GraphError::NodeNotFound(_))
        ));
        assert_eq!(selected.load(Ordering::SeqCst), 1);
    }
}
