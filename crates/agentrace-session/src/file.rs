use super::*;
use crate::types::ConversationHistory;
use agentrace_core::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// History kept as a pretty-printed JSON file
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn get(&self) -> Result<Option<ConversationHistory>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::History(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let history = serde_json::from_str(&raw).map_err(|e| {
            Error::History(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(history))
    }

    async fn put(&self, history: &ConversationHistory) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(history)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            Error::History(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            messages = history.messages.len(),
            "Saved conversation history"
        );
        Ok(())
    }
}
