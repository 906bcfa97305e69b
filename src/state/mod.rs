//! State management module
//!
//! Handles bookmark tracking and checkpointing between sync runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Bookmarks per stream, with per-partition page tracking
//! - `StateManager` - File-based state persistence with atomic saves

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{PartitionState, State, StreamState};

#[cfg(test)]
mod manager_tests;
