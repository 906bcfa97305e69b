//! Page-numbered reads of v1 `api_action`s
//!
//! v1 list actions page with a `page` query parameter and return records
//! under numeric keys next to `result_code`/`result_message` fields:
//!
//! ```json
//! {"0": {...}, "1": {...}, "result_code": 1, "result_message": "Success: ..."}
//! ```
//!
//! A page with `result_code` 0, no numeric keys, or an empty body ends the
//! stream. Emission and checkpointing stay with the caller.

use crate::error::Result;
use crate::http::{ActiveCampaignClient, RequestConfig};
use crate::types::{JsonValue, QueryParams};
use tracing::debug;

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page number that was requested
    pub number: u32,
    /// Records in server order
    pub records: Vec<JsonValue>,
}

/// Iterator-like reader over the pages of one v1 action
pub struct V1PageStream<'a> {
    client: &'a ActiveCampaignClient,
    name: String,
    action: String,
    params: QueryParams,
    next_page: u32,
    max_pages: Option<u32>,
    fetched: u32,
    done: bool,
}

impl<'a> V1PageStream<'a> {
    /// Create a stream reading `action`, tagged `name` in request logs
    pub fn new(
        client: &'a ActiveCampaignClient,
        name: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            action: action.into(),
            params: Vec::new(),
            next_page: 1,
            max_pages: None,
            fetched: 0,
            done: false,
        }
    }

    /// Extra query parameters sent with every page
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// First page to request (1-based)
    #[must_use]
    pub fn starting_at(mut self, page: u32) -> Self {
        self.next_page = page.max(1);
        self
    }

    /// Stop after this many pages
    #[must_use]
    pub fn max_pages(mut self, max: u32) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Stream name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the server reported the end of the data. Stopping at the
    /// page cap does not count.
    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    /// Fetch the next page, or `None` once the stream is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.done || self.max_pages.is_some_and(|max| self.fetched >= max) {
            return Ok(None);
        }

        let number = self.next_page;
        let config = RequestConfig::new()
            .query("page", number)
            .params(self.params.iter().cloned())
            .endpoint(self.name.clone());

        let payload = self.client.get(&self.action, config).await?;
        self.fetched += 1;

        let records = extract_records(&payload);
        if !has_more(&payload) || records.is_empty() {
            debug!("{}: no more pages after page {}", self.name, number);
            self.done = true;
            if records.is_empty() {
                return Ok(None);
            }
        }

        self.next_page += 1;
        Ok(Some(Page { number, records }))
    }
}

/// Records stored under numeric keys, in numeric key order
pub fn extract_records(payload: &JsonValue) -> Vec<JsonValue> {
    let Some(obj) = payload.as_object() else {
        return Vec::new();
    };

    let mut indexed: Vec<(u64, &JsonValue)> = obj
        .iter()
        .filter_map(|(k, v)| k.parse::<u64>().ok().map(|i| (i, v)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v.clone()).collect()
}

/// Whether the payload reports that more data may follow
pub fn has_more(payload: &JsonValue) -> bool {
    match payload.get("result_code") {
        Some(JsonValue::Number(n)) => n.as_i64() != Some(0),
        Some(JsonValue::String(s)) => s.trim() != "0",
        Some(_) => true,
        None => payload.as_object().is_some_and(|o| !o.is_empty()),
    }
}
