use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Network or API-level failure of the completion endpoint.
    #[error("Completion request failed: {0}")]
    Transport(String),

    /// Tool-call arguments could not be deserialized into the tool's parameters.
    #[error("Invalid arguments for tool '{tool}': {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller handed the agent an input shape it does not accept.
    #[error("Invalid agent input: {0}")]
    InvalidInput(String),

    #[error("Router loop reached {0} iterations without a final answer")]
    MaxIterations(usize),

    #[error("Run cancelled")]
    Cancelled,

    #[error("History error: {0}")]
    History(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use agentrace_core::Error;
    /// let err = Error::config_error("Tool catalog does not match the registry");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating transport errors
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// True for errors that point at a mismatch between the tool catalog,
    /// the registry and what the completion endpoint asked for.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::UnknownTool(_))
    }
}
