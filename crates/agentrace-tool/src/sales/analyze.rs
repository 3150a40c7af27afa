use super::ANALYZE_TOOL;
use super::llm::SalesModel;
use super::prompts;
use crate::{Tool, ToolContext, ToolOutput, ToolSchema, parse_args};
use agentrace_core::{ParameterSchema, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub(super) const DESCRIPTION: &str = "Analyze sales data to extract insights";

pub(super) fn parameters() -> ParameterSchema {
    ToolSchema::new()
        .required_string("data", "The lookup_sales_data tool's output.")
        .required_string("prompt", "An analysis prompt.")
        .build()
}

const NO_ANALYSIS: &str = "No analysis could be generated";

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    prompt: String,
    data: String,
}

pub struct AnalyzeSalesData {
    model: SalesModel,
}

impl AnalyzeSalesData {
    pub fn new(model: SalesModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Tool for AnalyzeSalesData {
    fn name(&self) -> &str {
        ANALYZE_TOOL
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> ParameterSchema {
        parameters()
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput> {
        let params: AnalyzeParams = parse_args(self.name(), args)?;
        let prompt = prompts::data_analysis(&params.data, &params.prompt);

        let analysis = self
            .model
            .complete(ctx.as_ref(), prompt, None)
            .await
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if analysis.is_empty() {
            return Ok(ToolOutput::failure(NO_ANALYSIS));
        }
        Ok(ToolOutput::ok(analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::llm::tests::{FixedModel, traced_context};
    use agentrace_core::Error;
    use agentrace_telemetry::testing::TestTelemetry;
    use serde_json::json;

    #[tokio::test]
    async fn test_analysis_text_is_returned() {
        let telemetry = TestTelemetry::new();
        let model = Arc::new(FixedModel::new("\n Sales were flat week over week.\n"));
        let tool = AnalyzeSalesData::new(SalesModel::new(model.clone(), "m"));

        let output = tool
            .execute(
                Arc::new(traced_context(&telemetry)),
                json!({"prompt": "How did sales change?", "data": "week, total\n1, 10\n2, 10"}),
            )
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.content, "Sales were flat week over week.");
        let requests = model.requests.lock().unwrap();
        assert!(requests[0].messages[0]
            .content
            .contains("Your job is to answer the following question: How did sales change?"));
    }

    #[tokio::test]
    async fn test_failed_or_empty_analysis() {
        let telemetry = TestTelemetry::new();
        for model in [
            FixedModel::new("   "),
            FixedModel::queue(vec![Err(Error::transport("down"))]),
        ] {
            let tool = AnalyzeSalesData::new(SalesModel::new(Arc::new(model), "m"));
            let output = tool
                .execute(
                    Arc::new(traced_context(&telemetry)),
                    json!({"prompt": "p", "data": "d"}),
                )
                .await
                .unwrap();
            assert!(!output.success);
            assert_eq!(output.content, NO_ANALYSIS);
        }
    }
}
