use agentrace_core::Message;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the history file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Saved transcript of the most recent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    #[serde(rename = "timeStamp", with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ConversationHistory {
    /// Stamped with the current local time, truncated to seconds
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            timestamp: now(),
            messages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn touch(&mut self) {
        self.timestamp = now();
    }
}

// Sub-second precision does not survive the file format
fn now() -> NaiveDateTime {
    let local = Local::now().naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
