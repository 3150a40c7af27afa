use super::VISUALIZE_TOOL;
use super::llm::SalesModel;
use super::prompts;
use crate::{Tool, ToolContext, ToolOutput, ToolSchema, parse_args};
use agentrace_core::{ParameterSchema, ResponseFormat, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

pub(super) const DESCRIPTION: &str = "Generate Python code to create data visualizations";

pub(super) fn parameters() -> ParameterSchema {
    ToolSchema::new()
        .required_string("data", "The lookup_sales_data tool's output.")
        .required_string(
            "visualizationGoal",
            "The goal of the visualization provided by the user.",
        )
        .build()
}

/// Chart description requested from the model before generating code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub chart_type: String,
    pub x_axis: String,
    pub y_axis: String,
    pub title: String,
}

impl ChartConfig {
    /// Used whenever the model cannot produce a usable configuration
    pub fn fallback(goal: &str) -> Self {
        Self {
            chart_type: "line".to_string(),
            x_axis: "date".to_string(),
            y_axis: "value".to_string(),
            title: goal.to_string(),
        }
    }
}

/// Strict JSON schema of [`ChartConfig`] for structured outputs
pub fn chart_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "chartType": {"type": "string", "description": "Type of chart to generate"},
            "xAxis": {"type": "string", "description": "Name of the X Axis column"},
            "yAxis": {"type": "string", "description": "Name of the Y Axis column"},
            "title": {"type": "string", "description": "Title of the chart"}
        },
        "required": ["chartType", "xAxis", "yAxis", "title"],
        "additionalProperties": false
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisualizeParams {
    data: String,
    visualization_goal: String,
}

pub struct GenerateVisualization {
    model: SalesModel,
}

impl GenerateVisualization {
    pub fn new(model: SalesModel) -> Self {
        Self { model }
    }

    async fn extract_chart_config(
        &self,
        ctx: &dyn ToolContext,
        data: &str,
        goal: &str,
    ) -> ChartConfig {
        let format = ResponseFormat {
            name: "chartConfiguration".to_string(),
            description: Some("A simple configuration for a chart".to_string()),
            schema: chart_config_schema(),
            strict: true,
        };

        let text = match self
            .model
            .complete(ctx, prompts::chart_config(data, goal), Some(format))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Chart configuration request failed, using fallback");
                return ChartConfig::fallback(goal);
            }
        };

        match serde_json::from_str(&prompts::strip_code_fence(&text, "json")) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable chart configuration, using fallback");
                ChartConfig::fallback(goal)
            }
        }
    }

    async fn create_chart(&self, ctx: &dyn ToolContext, config: &ChartConfig, data: &str) -> String {
        let rendered = json!({"config": config, "data": data}).to_string();

        match self
            .model
            .complete(ctx, prompts::chart_code(&rendered), None)
            .await
        {
            Ok(text) => prompts::strip_code_fence(&text, "python"),
            Err(e) => {
                tracing::warn!(error = %e, "Chart code request failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl Tool for GenerateVisualization {
    fn name(&self) -> &str {
        VISUALIZE_TOOL
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> ParameterSchema {
        parameters()
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput> {
        let params: VisualizeParams = parse_args(self.name(), args)?;

        let config = self
            .extract_chart_config(ctx.as_ref(), &params.data, &params.visualization_goal)
            .await;
        tracing::debug!(chart_type = %config.chart_type, "Chart configuration ready");

        let code = self.create_chart(ctx.as_ref(), &config, &params.data).await;
        if code.is_empty() {
            return Ok(ToolOutput::failure("No visualization code could be generated"));
        }
        Ok(ToolOutput::ok(code))
    }
}
