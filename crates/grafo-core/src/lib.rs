//! # Grafo Core
//!
//! A typed attribute-graph manipulation engine: graph store, query
//! engine, undoable command layer and workspace history, coordinated
//! by an embeddable platform context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ GraphPlatform  (plugin registries, workspaces,       │
//! │                 observer callbacks)                  │
//! │   ┌───────────────┐   ┌───────────────────────────┐  │
//! │   │ Workspace     │   │ CommandProcessor          │  │
//! │   │ original/     │   │ parse → execute → undo    │  │
//! │   │ current/      │   └────────────┬──────────────┘  │
//! │   │ history       │                │                 │
//! │   └───────┬───────┘                │                 │
//! │           │        ┌───────────────┤                 │
//! │           ▼        ▼               ▼                 │
//! │   ┌───────────────────┐   ┌────────────────┐         │
//! │   │ query (filter/    │   │ Graph store    │         │
//! │   │ search → subgraph)│   │ nodes/edges/   │         │
//! │   └───────────────────┘   │ adjacency      │         │
//! │                           └────────────────┘         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design constraints
//!
//! - **Pure and synchronous**: no I/O, no async, no globals. File
//!   access and rendering live in host plugins behind the
//!   [`platform::DataSourcePlugin`] / [`platform::VisualizerPlugin`]
//!   traits.
//! - **Deterministic**: `BTreeMap` storage everywhere, so iteration
//!   order, listings and messages are stable across runs.
//! - **Atomic operations**: every mutation validates before it
//!   touches state; a failure leaves graph, history and undo stack
//!   exactly as they were.
//!
//! ## Example
//!
//! ```
//! use grafo_core::command::processor::CommandProcessor;
//! use grafo_core::graph::Graph;
//!
//! let mut graph = Graph::new("demo");
//! let mut processor = CommandProcessor::new();
//!
//! processor.process("create node --id=a --property Age=30", &mut graph);
//! processor.process("create node --id=b --property Age=25", &mut graph);
//! processor.process("create edge --id=e a b", &mut graph);
//!
//! let result = processor.process("filter Age >= 28", &mut graph);
//! assert!(result.success);
//! assert_eq!(graph.node_count(), 1);
//!
//! processor.process("undo", &mut graph);
//! assert_eq!(graph.node_count(), 2);
//! ```

pub mod command;
pub mod config;
pub mod graph;
pub mod platform;
pub mod query;
pub mod types;
pub mod workspace;

pub use command::processor::CommandProcessor;
pub use command::{Command, CommandAction, CommandResult};
pub use config::PlatformConfig;
pub use graph::{Edge, EdgeDirection, Graph, Node};
pub use platform::{DataSourcePlugin, EventKind, GraphPlatform, PlatformEvent, VisualizerPlugin};
pub use types::{AttrValue, Attributes, ComparisonOp, GraphError, ValueType};
pub use workspace::{Workspace, WorkspaceSummary};
