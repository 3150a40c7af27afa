use agentrace_core::ParameterSchema;
use serde_json::{Map, Value, json};

/// Builds the `parameters` object of a catalog entry by hand.
///
/// Every parameter the sales tools take is a string, so the builder only
/// knows about typed properties and the required list.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    schema: ParameterSchema,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self {
            schema: ParameterSchema {
                schema_type: "object".to_string(),
                properties: Map::new(),
                required: Vec::new(),
            },
        }
    }

    /// Declare an optional property of a JSON type
    pub fn property(mut self, name: &str, json_type: &str, description: &str) -> Self {
        self.schema.properties.insert(
            name.to_string(),
            json!({ "type": json_type, "description": description }),
        );
        self
    }

    /// Declare a string property the model must always fill in
    pub fn required_string(mut self, name: &str, description: &str) -> Self {
        self = self.property(name, "string", description);
        if !self.schema.required.iter().any(|r| r == name) {
            self.schema.required.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> ParameterSchema {
        self.schema
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ToolSchema> for Value {
    fn from(schema: ToolSchema) -> Self {
        json!({
            "type": schema.schema.schema_type,
            "properties": schema.schema.properties,
            "required": schema.schema.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualization_parameters() {
        let schema = ToolSchema::new()
            .required_string("data", "The lookup result")
            .required_string("visualizationGoal", "What the chart should show")
            .build();

        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.required, vec!["data", "visualizationGoal"]);
        assert_eq!(schema.properties["data"]["type"], "string");
    }

    #[test]
    fn test_optional_property_is_not_required() {
        let value: Value = ToolSchema::new()
            .required_string("prompt", "The unchanged user prompt")
            .property("limit", "integer", "Row cap")
            .into();

        assert_eq!(value["properties"]["limit"]["type"], "integer");
        assert_eq!(value["required"], json!(["prompt"]));
    }

    #[test]
    fn test_required_is_not_duplicated() {
        let schema = ToolSchema::new()
            .required_string("prompt", "first")
            .required_string("prompt", "second")
            .build();

        assert_eq!(schema.required, vec!["prompt"]);
        assert_eq!(schema.properties["prompt"]["description"], "second");
    }
}
