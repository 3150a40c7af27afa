//! Tools over the Store Sales Price Elasticity Promotions dataset
//!
//! - `LookUpSalesData`: asks the model for SQL, runs it, returns a text table
//! - `AnalyzeSalesData`: asks the model to answer a question about a table
//! - `GenerateVisualization`: asks the model for a chart config, then for
//!   Python code drawing it

mod analyze;
mod llm;
mod lookup;
pub mod prompts;
mod sqlite;
mod store;
mod visualize;

pub use analyze::AnalyzeSalesData;
pub use llm::SalesModel;
pub use lookup::LookUpSalesData;
pub use sqlite::SqliteSalesStore;
pub use store::{QueryRows, SalesStore};
pub use visualize::{ChartConfig, GenerateVisualization, chart_config_schema};

use crate::Tool;
use agentrace_core::{ToolCatalog, ToolDefinition};
use std::sync::Arc;

pub const LOOKUP_TOOL: &str = "LookUpSalesData";
pub const ANALYZE_TOOL: &str = "AnalyzeSalesData";
pub const VISUALIZE_TOOL: &str = "GenerateVisualization";

/// The three sales tools sharing one store and one model
pub fn sales_tools(store: Arc<dyn SalesStore>, model: SalesModel) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(LookUpSalesData::new(store, model.clone())),
        Arc::new(AnalyzeSalesData::new(model.clone())),
        Arc::new(GenerateVisualization::new(model)),
    ]
}

/// Catalog describing exactly the tools returned by [`sales_tools`]
pub fn default_catalog() -> ToolCatalog {
    ToolCatalog::new(vec![
        ToolDefinition::function(LOOKUP_TOOL, lookup::DESCRIPTION, lookup::parameters()),
        ToolDefinition::function(ANALYZE_TOOL, analyze::DESCRIPTION, analyze::parameters()),
        ToolDefinition::function(
            VISUALIZE_TOOL,
            visualize::DESCRIPTION,
            visualize::parameters(),
        ),
    ])
}
