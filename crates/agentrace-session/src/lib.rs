//! Conversation history persistence for agentrace

use agentrace_core::Result;
use async_trait::async_trait;

pub mod file;
pub mod inmemory;
pub mod types;

pub use file::JsonFileHistoryStore;
pub use inmemory::InMemoryHistoryStore;
pub use types::{ConversationHistory, TIMESTAMP_FORMAT};

/// Loads the conversation at run start and saves it at run end
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// `None` when nothing has been saved yet
    async fn get(&self) -> Result<Option<ConversationHistory>>;
    async fn put(&self, history: &ConversationHistory) -> Result<()>;
}
