//! # Configuration
//!
//! Tunables for a [`GraphPlatform`](crate::platform::GraphPlatform).
//! Hosts typically deserialize this from a config file; every field
//! has a default, so a missing or partial file works.

use crate::command::processor::DEFAULT_UNDO_DEPTH;
use crate::workspace::DEFAULT_HISTORY_DEPTH;
use serde::{Deserialize, Serialize};

/// Platform tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Snapshot history bound per workspace; the oldest entry is
    /// evicted when full.
    pub max_history_depth: usize,

    /// Undo stack bound for command processors created by the host.
    pub max_undo_depth: usize,

    /// Data source to use when none is named.
    pub default_data_source: Option<String>,

    /// Visualizer to use when none is named.
    pub default_visualizer: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_HISTORY_DEPTH,
            max_undo_depth: DEFAULT_UNDO_DEPTH,
            default_data_source: None,
            default_visualizer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PlatformConfig::default();
        assert_eq!(c.max_history_depth, 50);
        assert_eq!(c.max_undo_depth, 50);
        assert!(c.default_data_source.is_none());
    }

    #[test]
    fn partial_deserialization_fills_defaults() {
        let c: PlatformConfig =
            serde_json::from_str(r#"{"max_history_depth": 10}"#).expect("deserialize");
        assert_eq!(c.max_history_depth, 10);
        assert_eq!(c.max_undo_depth, 50);
    }
}
