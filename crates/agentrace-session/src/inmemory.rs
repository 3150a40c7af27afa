use super::*;
use crate::types::ConversationHistory;
use tokio::sync::RwLock;

/// Process-local history, used by tests and one-shot embeddings
#[derive(Default)]
pub struct InMemoryHistoryStore {
    history: RwLock<Option<ConversationHistory>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: ConversationHistory) -> Self {
        Self {
            history: RwLock::new(Some(history)),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get(&self) -> Result<Option<ConversationHistory>> {
        Ok(self.history.read().await.clone())
    }

    async fn put(&self, history: &ConversationHistory) -> Result<()> {
        *self.history.write().await = Some(history.clone());
        Ok(())
    }
}
