//! agentrace: ask the sales agent one question, with every step traced.

use agentrace_agent::{Agent, AgentOutcome};
use agentrace_core::{AgentConfig, LLM, ToolCatalog};
use agentrace_model::OpenAIBuilder;
use agentrace_runner::{RunConfig, Runner};
use agentrace_session::JsonFileHistoryStore;
use agentrace_telemetry::{SpanTree, TelemetryConfig, init_telemetry};
use agentrace_tool::sales::{SalesModel, SqliteSalesStore, default_catalog, sales_tools};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "agentrace", version)]
#[command(about = "Ask the sales data agent a question")]
struct Args {
    /// Question for the agent
    prompt: String,

    /// Start a new conversation instead of continuing the saved one
    #[arg(long)]
    restart: bool,

    /// Path to agentrace.toml (default: searched from the current directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = AgentConfig::load_or_env(args.config.as_deref())?;
    let telemetry = init_telemetry(&telemetry_config(&config))
        .context("Failed to initialise telemetry")?;

    let result = run(&args, &config, telemetry.spans()).await;

    // Flush before exiting so the trace of a failed run is exported too
    if let Err(e) = telemetry.shutdown() {
        tracing::warn!(error = %e, "Telemetry shutdown failed");
    }

    let outcome = result?;
    println!("{}", outcome.answer);
    Ok(())
}

fn telemetry_config(config: &AgentConfig) -> TelemetryConfig {
    let mut telemetry = TelemetryConfig::new(config.telemetry.project_name.clone());
    if !config.telemetry.enabled {
        return telemetry;
    }
    if let Some(endpoint) = &config.telemetry.collector_endpoint {
        telemetry = telemetry.with_collector(endpoint.clone());
    }
    if let Some(headers) = &config.telemetry.headers {
        telemetry = telemetry.with_headers(headers.clone());
    }
    telemetry
}

fn load_catalog(path: &Path) -> anyhow::Result<ToolCatalog> {
    if path.exists() {
        return ToolCatalog::load(path)
            .with_context(|| format!("Failed to load tool catalog {}", path.display()));
    }
    tracing::warn!(path = %path.display(), "Tool catalog not found, using built-in definitions");
    Ok(default_catalog())
}

async fn run(args: &Args, config: &AgentConfig, spans: SpanTree) -> anyhow::Result<AgentOutcome> {
    let model: Arc<dyn LLM> = Arc::new(OpenAIBuilder::from_agent_config(config)?.build()?);

    let store = SqliteSalesStore::connect(
        &config.data.database_url,
        config.data.table.clone(),
        config.data.row_limit,
    )
    .await
    .with_context(|| format!("Failed to open sales database {}", config.data.database_url))?;

    let sales_model =
        SalesModel::new(model.clone(), config.model.name.clone()).with_max_tokens(config.model.max_tokens);

    let agent = Agent::builder()
        .config(config)
        .model(model)
        .tools(sales_tools(Arc::new(store), sales_model))
        .catalog(load_catalog(&config.agent.tool_catalog)?)
        .spans(spans)
        .build()?;

    let runner = Runner::builder()
        .agent(Arc::new(agent))
        .history(Arc::new(JsonFileHistoryStore::new(config.history.path.clone())))
        .build()?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            trigger.cancel();
        }
    });

    let outcome = runner
        .run_with_cancellation(
            args.prompt.clone(),
            RunConfig {
                restart: args.restart,
            },
            Some(cancel),
        )
        .await?;

    Ok(outcome)
}
