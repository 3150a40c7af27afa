//! Shared fixtures for the workspace integration tests
#![allow(dead_code)]

use agentrace_agent::Agent;
use agentrace_core::LLM;
use agentrace_telemetry::testing::{SpanData, TestTelemetry};
use agentrace_tool::sales::{SalesModel, SqliteSalesStore, default_catalog, sales_tools};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

pub const MODEL_NAME: &str = "gpt-4o-mini";

pub const STORE_7_SQL: &str = "```sql\nSELECT Store_Number, SUM(Total_Sale_Value) AS total FROM sales WHERE Store_Number = 7 GROUP BY Store_Number\n```";

/// Writable in-memory database holding a sales table with two stores
pub async fn seeded_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE sales (Store_Number INTEGER, Date TEXT, Total_Sale_Value REAL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO sales VALUES \
         (7, '2021-11-01', 100.0), (7, '2021-11-02', 50.5), (8, '2021-11-01', 3.0)",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

pub async fn seeded_store() -> Arc<SqliteSalesStore> {
    Arc::new(SqliteSalesStore::from_pool(seeded_pool().await, "sales", 200))
}

/// Router and sales tools share `model`, as they do in the binary
pub async fn sales_agent(model: Arc<dyn LLM>, telemetry: &TestTelemetry) -> Agent {
    sales_agent_on(model, seeded_store().await, telemetry)
}

pub fn sales_agent_on(
    model: Arc<dyn LLM>,
    store: Arc<SqliteSalesStore>,
    telemetry: &TestTelemetry,
) -> Agent {
    let sales_model = SalesModel::new(model.clone(), MODEL_NAME);
    Agent::builder()
        .model(model)
        .model_name(MODEL_NAME)
        .tools(sales_tools(store, sales_model))
        .catalog(default_catalog())
        .spans(telemetry.spans())
        .build()
        .unwrap()
}

/// Spans whose exported kind is `kind`
pub fn spans_of_kind(telemetry: &TestTelemetry, kind: &str) -> Vec<SpanData> {
    telemetry
        .finished_spans()
        .into_iter()
        .filter(|s| TestTelemetry::kind_of(s).as_deref() == Some(kind))
        .collect()
}
