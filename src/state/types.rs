//! State types for tracking sync progress
//!
//! Serialised as the standard tap state document:
//! `{"bookmarks": {"<stream>": {...}}, "currently_syncing": "<stream>"}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a sync run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,

    /// Stream in progress when the state was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Last completed page for a stream partition
    pub fn get_page(&self, stream: &str, partition: &str) -> Option<u32> {
        self.bookmarks.get(stream)?.partitions.get(partition)?.page
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Per-partition state, e.g. one entry per campaign id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<String, PartitionState>,
}

impl StreamState {
    /// Get mutable partition state, creating if needed
    pub fn get_partition_mut(&mut self, partition: &str) -> &mut PartitionState {
        self.partitions.entry(partition.to_string()).or_default()
    }

    /// Check if a partition is completed
    pub fn is_partition_completed(&self, partition: &str) -> bool {
        self.partitions.get(partition).is_some_and(|p| p.completed)
    }
}

/// State for a single partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Last page fully emitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Whether this partition has been fully synced
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"bookmarks": {}}));
    }

    #[test]
    fn test_partition_pages() {
        let mut state = State::new();
        let stream = state.get_stream_mut("campaign_report_open_list");
        stream.get_partition_mut("123").page = Some(3);
        stream.get_partition_mut("456").completed = true;

        assert_eq!(state.get_page("campaign_report_open_list", "123"), Some(3));
        assert_eq!(state.get_page("campaign_report_open_list", "999"), None);
        assert!(state
            .get_stream("campaign_report_open_list")
            .unwrap()
            .is_partition_completed("456"));
    }

    #[test]
    fn test_state_document_shape() {
        let raw = json!({
            "bookmarks": {
                "campaign_report_open_list": {
                    "partitions": {"123": {"page": 2, "completed": false}}
                },
                "campaign_list": {
                    "partitions": {"default": {"page": 7, "completed": true}}
                }
            },
            "currently_syncing": "campaign_report_open_list"
        });

        let state: State = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(state.get_page("campaign_list", "default"), Some(7));
        assert_eq!(state.get_page("campaign_report_open_list", "123"), Some(2));
        assert_eq!(serde_json::to_value(&state).unwrap(), raw);
    }
}
