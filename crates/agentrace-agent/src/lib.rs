//! Tool-calling router agent for agentrace

pub mod builder;
pub mod formatter;
pub mod router;
pub mod testing;

pub use builder::AgentBuilder;
pub use formatter::{AgentInput, format_messages};
pub use router::{Agent, AgentOutcome, RouterState};
