//! # Workspace
//!
//! A loaded graph plus its transformation history.
//!
//! The workspace keeps the pristine original graph, the current
//! (possibly filtered) view, and a bounded stack of pre-transformation
//! snapshots. Queries run compute-first: the snapshot is pushed only
//! once the query engine has succeeded, so a failed query changes
//! nothing, history included.

use crate::graph::Graph;
use crate::query;
use crate::types::GraphError;
use serde::Serialize;
use uuid::Uuid;

/// Default depth of the snapshot history stack.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// A graph under interactive manipulation.
#[derive(Debug, Clone)]
pub struct Workspace {
    id: String,
    name: String,
    data_source: String,
    file_path: String,
    original: Graph,
    current: Graph,
    history: Vec<Graph>,
    max_history: usize,
}

impl Workspace {
    /// Create a workspace around a loaded graph, with the default
    /// history depth. The id is a fresh UUID.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self::with_history_depth(graph, DEFAULT_HISTORY_DEPTH)
    }

    /// Create a workspace with an explicit history depth. When the
    /// stack is full the oldest snapshot is evicted.
    #[must_use]
    pub fn with_history_depth(graph: Graph, max_history: usize) -> Self {
        let id = Uuid::new_v4().to_string();
        let name = format!("workspace-{}", id.get(..8).unwrap_or(id.as_str()));
        Self {
            id,
            name,
            data_source: String::new(),
            file_path: String::new(),
            original: graph.clone(),
            current: graph,
            history: Vec::new(),
            max_history,
        }
    }

    /// Builder: set a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: record which plugin and source the graph came from.
    #[must_use]
    pub fn with_source(mut self, data_source: impl Into<String>, file_path: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self.file_path = file_path.into();
        self
    }

    /// Workspace identifier (UUID string).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the data-source plugin the graph was loaded through.
    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Source location the graph was loaded from.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// The current (possibly transformed) graph view.
    #[must_use]
    pub fn current_graph(&self) -> &Graph {
        &self.current
    }

    /// Mutable access to the current view, for hosts driving the
    /// command layer directly.
    pub fn current_graph_mut(&mut self) -> &mut Graph {
        &mut self.current
    }

    /// An independent copy of the graph as originally loaded.
    #[must_use]
    pub fn original_graph(&self) -> Graph {
        self.original.clone()
    }

    /// Number of snapshots currently undoable.
    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Filter the current view. On success the previous view is pushed
    /// onto the history stack and the result becomes current.
    pub fn apply_filter(&mut self, query_str: &str) -> Result<&Graph, GraphError> {
        let result = query::filter(&self.current, query_str)?;
        self.push_snapshot();
        self.current = result;
        tracing::info!(
            workspace = %self.id,
            query = query_str,
            nodes = self.current.node_count(),
            edges = self.current.edge_count(),
            "filter applied"
        );
        Ok(&self.current)
    }

    /// Search the current view. Same snapshot discipline as
    /// [`Workspace::apply_filter`].
    pub fn apply_search(&mut self, query_str: &str) -> Result<&Graph, GraphError> {
        let result = query::search(&self.current, query_str)?;
        self.push_snapshot();
        self.current = result;
        tracing::info!(
            workspace = %self.id,
            query = query_str,
            nodes = self.current.node_count(),
            "search applied"
        );
        Ok(&self.current)
    }

    /// Pop the most recent snapshot and make it current. `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Graph> {
        let previous = self.history.pop()?;
        self.current = previous;
        tracing::info!(workspace = %self.id, remaining = self.history.len(), "undo");
        Some(&self.current)
    }

    /// Restore the original graph and clear the history.
    pub fn reset(&mut self) -> &Graph {
        self.history.clear();
        self.current = self.original.clone();
        tracing::info!(workspace = %self.id, "workspace reset");
        &self.current
    }

    /// Snapshot the current view onto the bounded history stack.
    fn push_snapshot(&mut self) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() >= self.max_history {
            self.history.remove(0);
        }
        self.history.push(self.current.clone());
    }

    /// A serializable summary of the workspace state.
    #[must_use]
    pub fn summary(&self) -> WorkspaceSummary {
        WorkspaceSummary {
            workspace_id: self.id.clone(),
            name: self.name.clone(),
            data_source: self.data_source.clone(),
            file_path: self.file_path.clone(),
            nodes: self.current.node_count(),
            edges: self.current.edge_count(),
            history_depth: self.history.len(),
        }
    }
}

/// Flat workspace description for status output.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSummary {
    pub workspace_id: String,
    pub name: String,
    pub data_source: String,
    pub file_path: String,
    pub nodes: usize,
    pub edges: usize,
    pub history_depth: usize,
}

// =============================================================================
// TESTS
// =============================================================================
