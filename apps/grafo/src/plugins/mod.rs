//! Built-in plugins registered by the CLI at startup.
//!
//! These are ordinary implementations of the core's plugin traits;
//! nothing here is privileged over plugins a host might add.

mod json_source;
mod outline_visualizer;

pub use json_source::JsonDataSource;
pub use outline_visualizer::OutlineVisualizer;
