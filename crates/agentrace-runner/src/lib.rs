//! Runner for executing the agent against a persisted conversation

pub mod runner;

pub use runner::{RunConfig, Runner, RunnerBuilder};
