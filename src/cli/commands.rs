//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ActiveCampaign extraction tap
#[derive(Parser, Debug)]
#[command(name = "tap-activecampaign")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON (takes precedence over --config)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON); read at start and rewritten after each page
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify the API token
    Check,

    /// Issue a single GET for a v1 api_action and print the payload
    Request {
        /// v1 api_action name, e.g. `campaign_list`
        action: String,

        /// Extra query parameters (`key=value`, repeatable)
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Page through a v1 api_action, emitting RECORD and STATE messages
    Read {
        /// v1 api_action name, e.g. `campaign_report_open_list`
        action: String,

        /// Stream name used in messages and state (defaults to the action)
        #[arg(long)]
        stream: Option<String>,

        /// Extra query parameters (`key=value`, repeatable)
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Maximum pages to fetch
        #[arg(long)]
        max_pages: Option<u32>,
    },
}

/// Parse a `key=value` pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
