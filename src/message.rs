//! Messages written to stdout during a sync
//!
//! One JSON object per line, tagged by `"type"`.

use crate::error::Result;
use crate::state::State;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// A single extracted record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: Value,
        /// When the record was extracted
        #[serde(serialize_with = "rfc3339")]
        time_extracted: DateTime<Utc>,
    },
    /// State checkpoint
    State {
        /// Full state document
        value: State,
    },
}

impl Message {
    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: Value) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: State) -> Self {
        Self::State { value }
    }

    /// Serialise as a single output line (without trailing newline)
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn rfc3339<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_record_line() {
        let msg = Message::Record {
            stream: "campaign_report_open_list".into(),
            record: json!({"subscriberid": "111"}),
            time_extracted: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };

        let line: Value = serde_json::from_str(&msg.to_line().unwrap()).unwrap();
        assert_eq!(
            line,
            json!({
                "type": "RECORD",
                "stream": "campaign_report_open_list",
                "record": {"subscriberid": "111"},
                "time_extracted": "2024-03-01T12:00:00.000000Z"
            })
        );
    }

    #[test]
    fn test_state_line() {
        let mut state = State::new();
        state
            .get_stream_mut("campaign_list")
            .get_partition_mut("default")
            .page = Some(3);

        let line: Value = serde_json::from_str(&Message::state(state).to_line().unwrap()).unwrap();
        assert_eq!(
            line,
            json!({
                "type": "STATE",
                "value": {"bookmarks": {"campaign_list": {
                    "partitions": {"default": {"page": 3, "completed": false}}
                }}}
            })
        );
    }
}
