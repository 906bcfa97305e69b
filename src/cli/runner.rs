//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::{ActiveCampaignClient, RequestConfig};
use crate::message::Message;
use crate::state::StateManager;
use crate::stream::V1PageStream;
use serde_json::json;
use std::io::Write;
use tracing::info;

/// Partition key used when a read has no partitioning parameter
const DEFAULT_PARTITION: &str = "default";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        // Dropping the client closes its session on every exit path
        let client = ActiveCampaignClient::new(config.client_config()?)?;

        match &self.cli.command {
            Commands::Check => self.check(&client).await,
            Commands::Request { action, params } => self.request(&client, action, params).await,
            Commands::Read {
                action,
                stream,
                params,
                max_pages,
            } => {
                let stream = stream.as_deref().unwrap_or(action);
                self.read(&client, action, stream, params, *max_pages).await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }

        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "No configuration given (use --config or --config-json)",
            )),
        }
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    /// Verify credentials
    async fn check(&self, client: &ActiveCampaignClient) -> Result<()> {
        client.verify().await?;
        emit_line(&mut std::io::stdout(), &json!({"status": "SUCCEEDED"}).to_string())
    }

    /// Single request
    async fn request(
        &self,
        client: &ActiveCampaignClient,
        action: &str,
        params: &[(String, String)],
    ) -> Result<()> {
        let config = RequestConfig::new()
            .params(params.iter().cloned())
            .endpoint(action);
        let payload = client.get(action, config).await?;
        emit_line(&mut std::io::stdout(), &serde_json::to_string_pretty(&payload)?)
    }

    /// Page through an action, checkpointing after each page
    async fn read(
        &self,
        client: &ActiveCampaignClient,
        action: &str,
        stream: &str,
        params: &[(String, String)],
        max_pages: Option<u32>,
    ) -> Result<()> {
        let state = self.load_state()?;
        let target = ReadTarget {
            action,
            stream,
            params,
            max_pages,
        };
        let total = sync_partition(client, &state, &target, &mut std::io::stdout()).await?;
        info!("{stream}: extracted {total} records");
        Ok(())
    }
}

/// What a `read` pages through
#[derive(Debug, Clone, Copy)]
pub struct ReadTarget<'a> {
    /// v1 `api_action`
    pub action: &'a str,
    /// Stream name used for records and bookmarks
    pub stream: &'a str,
    /// Extra query parameters; they also name the state partition
    pub params: &'a [(String, String)],
    /// Stop after this many pages
    pub max_pages: Option<u32>,
}

/// Sync one stream partition into `out`.
///
/// Resumes after the last page recorded in `state`. After every page the
/// RECORD lines are written, the page is bookmarked, state is saved and a
/// STATE line follows. The partition is marked completed only when the
/// server reports the end of the data. A completed partition is skipped.
/// Returns the number of records written.
pub async fn sync_partition<W: Write>(
    client: &ActiveCampaignClient,
    state: &StateManager,
    target: &ReadTarget<'_>,
    out: &mut W,
) -> Result<usize> {
    let stream = target.stream;
    let partition = partition_key(target.params);

    if state.is_partition_completed(stream, &partition).await {
        info!("{stream}/{partition} already completed, skipping");
        emit_line(out, &Message::state(state.snapshot().await).to_line()?)?;
        return Ok(0);
    }

    let resume_from = state.get_page(stream, &partition).await.map_or(1, |p| p + 1);
    info!("Syncing {stream} ({partition}) from page {resume_from}");
    state.set_currently_syncing(Some(stream)).await;

    let mut pages = V1PageStream::new(client, stream, target.action)
        .with_params(target.params.to_vec())
        .starting_at(resume_from);
    if let Some(max) = target.max_pages {
        pages = pages.max_pages(max);
    }

    let mut total = 0usize;
    while let Some(page) = pages.next_page().await? {
        for record in page.records {
            emit_line(out, &Message::record(stream, record).to_line()?)?;
            total += 1;
        }
        state.set_page(stream, &partition, page.number).await;
        state.save().await?;
        emit_line(out, &Message::state(state.snapshot().await).to_line()?)?;
    }

    if pages.is_exhausted() {
        state.mark_partition_completed(stream, &partition).await;
    }
    state.set_currently_syncing(None).await;
    state.save().await?;
    emit_line(out, &Message::state(state.snapshot().await).to_line()?)?;

    Ok(total)
}

/// Partition key for state: the non-paging parameters, or a fixed default
pub fn partition_key(params: &[(String, String)]) -> String {
    if params.is_empty() {
        return DEFAULT_PARTITION.to_string();
    }
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn emit_line<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_key() {
        assert_eq!(partition_key(&[]), "default");
        assert_eq!(
            partition_key(&[
                ("campaignid".to_string(), "123".to_string()),
                ("messageid".to_string(), "9".to_string())
            ]),
            "campaignid=123&messageid=9"
        );
    }
}
