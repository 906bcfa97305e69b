//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Verify the API token
//! - `request` - Issue one v1 request and print the payload
//! - `read` - Page through a v1 action emitting RECORD/STATE messages

mod commands;
mod runner;

pub use commands::{parse_key_val, Cli, Commands};
pub use runner::{partition_key, sync_partition, ReadTarget, Runner};
