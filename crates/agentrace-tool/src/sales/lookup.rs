use super::LOOKUP_TOOL;
use super::llm::SalesModel;
use super::prompts;
use super::store::SalesStore;
use crate::{Tool, ToolContext, ToolOutput, ToolSchema, parse_args};
use agentrace_core::{ParameterSchema, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub(super) const DESCRIPTION: &str = "Look up data from the Store Sales Price Elasticity Promotions dataset";

pub(super) fn parameters() -> ParameterSchema {
    ToolSchema::new()
        .required_string("prompt", "The unchanged prompt that the user provided.")
        .build()
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    prompt: String,
}

/// Turns a question into SQL through the model and runs it against the store
pub struct LookUpSalesData {
    store: Arc<dyn SalesStore>,
    model: SalesModel,
}

impl LookUpSalesData {
    pub fn new(store: Arc<dyn SalesStore>, model: SalesModel) -> Self {
        Self { store, model }
    }
}

#[async_trait]
impl Tool for LookUpSalesData {
    fn name(&self) -> &str {
        LOOKUP_TOOL
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> ParameterSchema {
        parameters()
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput> {
        let params: LookupParams = parse_args(self.name(), args)?;

        let columns = match self.store.columns().await {
            Ok(columns) => columns,
            Err(e) => {
                tracing::warn!(error = %e, "Column lookup failed");
                return Ok(ToolOutput::failure(format!(
                    "Failed to fetch database columns: {}",
                    e
                )));
            }
        };

        let prompt = prompts::sql_generation(&params.prompt, &columns, self.store.table());
        let sql = match self.model.complete(ctx.as_ref(), prompt, None).await {
            Ok(text) => prompts::strip_code_fence(&text, "sql"),
            Err(e) => {
                return Ok(ToolOutput::failure(format!(
                    "Failed to generate SQL query: {}",
                    e
                )));
            }
        };
        if sql.is_empty() {
            return Ok(ToolOutput::failure(
                "Failed to generate SQL query: the model returned no query",
            ));
        }

        tracing::info!(run_id = %ctx.run_id(), sql = %sql, "Query to be used");

        match self.store.query(&sql).await {
            Ok(rows) => Ok(ToolOutput::ok(rows.render())),
            Err(e) => {
                tracing::warn!(error = %e, "Sales query failed");
                Ok(ToolOutput::failure(format!(
                    "Failed to select data from database: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::SqliteSalesStore;
    use crate::sales::llm::tests::{FixedModel, traced_context};
    use agentrace_core::Error;
    use agentrace_telemetry::testing::TestTelemetry;
    use serde_json::json;

    async fn store() -> Arc<SqliteSalesStore> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE sales (Store_Number INTEGER, Total_Sale_Value REAL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sales VALUES (7, 100.0), (7, 50.5), (8, 3.0)")
            .execute(&pool)
            .await
            .unwrap();
        Arc::new(SqliteSalesStore::from_pool(pool, "sales", 50))
    }

    #[tokio::test]
    async fn test_lookup_runs_generated_sql() {
        let telemetry = TestTelemetry::new();
        let model = Arc::new(FixedModel::new(
            "```sql\nSELECT Store_Number, SUM(Total_Sale_Value) AS total FROM sales WHERE Store_Number = 7 GROUP BY Store_Number\n```",
        ));
        let tool = LookUpSalesData::new(store().await, SalesModel::new(model.clone(), "m"));

        let output = tool
            .execute(
                Arc::new(traced_context(&telemetry)),
                json!({"prompt": "What were sales for store 7?"}),
            )
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.content, "Store_Number, total\n7, 150.5");

        let requests = model.requests.lock().unwrap();
        assert!(requests[0].messages[0]
            .content
            .contains("The available columns are: Store_Number, Total_Sale_Value"));
    }

    #[tokio::test]
    async fn test_bad_sql_is_recoverable() {
        let telemetry = TestTelemetry::new();
        let model = Arc::new(FixedModel::new("DELETE FROM sales"));
        let tool = LookUpSalesData::new(store().await, SalesModel::new(model, "m"));

        let output = tool
            .execute(Arc::new(traced_context(&telemetry)), json!({"prompt": "x"}))
            .await
            .unwrap();

        assert!(!output.success);
        assert!(output.content.starts_with("Failed to select data from database"));
    }

    #[tokio::test]
    async fn test_model_failure_is_recoverable() {
        let telemetry = TestTelemetry::new();
        let model = Arc::new(FixedModel::queue(vec![Err(Error::transport("timeout"))]));
        let tool = LookUpSalesData::new(store().await, SalesModel::new(model, "m"));

        let output = tool
            .execute(Arc::new(traced_context(&telemetry)), json!({"prompt": "x"}))
            .await
            .unwrap();

        assert!(!output.success);
        assert!(output.content.starts_with("Failed to generate SQL query"));
    }

    #[tokio::test]
    async fn test_missing_prompt_is_invalid_arguments() {
        let telemetry = TestTelemetry::new();
        let tool = LookUpSalesData::new(
            store().await,
            SalesModel::new(Arc::new(FixedModel::new("")), "m"),
        );

        let err = tool
            .execute(Arc::new(traced_context(&telemetry)), json!({"data": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }
}
