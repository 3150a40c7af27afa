use crate::{Tool, ToolContext, ToolOutput, parse_args};
use agentrace_core::{Error, ParameterSchema, Result};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Type alias for tool execution function
pub type ToolFn<T> =
    Box<dyn Fn(Arc<dyn ToolContext>, T) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A closure-backed tool over typed parameters `T`.
///
/// Arguments are deserialized into `T` before the closure runs, so a call
/// with missing or mistyped fields fails with `Error::InvalidArguments`
/// and the closure never sees it. Whatever JSON the closure returns is
/// coerced to plain text.
pub struct FunctionTool<T> {
    name: String,
    description: String,
    schema: ParameterSchema,
    execute_fn: ToolFn<T>,
}

impl<T> FunctionTool<T> {
    pub fn builder() -> FunctionToolBuilder<T> {
        FunctionToolBuilder::new()
    }
}

impl<T> std::fmt::Debug for FunctionTool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish()
    }
}

#[async_trait]
impl<T> Tool for FunctionTool<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> ParameterSchema {
        self.schema.clone()
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<ToolOutput> {
        let params: T = parse_args(&self.name, args)?;
        let value = (self.execute_fn)(ctx, params).await?;
        Ok(ToolOutput::from_value(value))
    }
}

/// Builder for FunctionTool
pub struct FunctionToolBuilder<T> {
    name: Option<String>,
    description: Option<String>,
    schema: Option<ParameterSchema>,
    execute_fn: Option<ToolFn<T>>,
    _params: PhantomData<fn() -> T>,
}

impl<T> FunctionToolBuilder<T> {
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            schema: None,
            execute_fn: None,
            _params: PhantomData,
        }
    }

    /// Name the model calls the tool by; must match the catalog entry
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn schema(self, schema: ParameterSchema) -> Self {
        Self {
            schema: Some(schema),
            ..self
        }
    }

    pub fn execute<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<dyn ToolContext>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            execute_fn: Some(Box::new(move |ctx, params| f(ctx, params).boxed())),
            ..self
        }
    }

    /// A tool without a schema takes no parameters
    pub fn build(self) -> Result<FunctionTool<T>> {
        let missing = |what: &str| Error::config_error(format!("Function tool needs a {what}"));
        Ok(FunctionTool {
            name: self.name.ok_or_else(|| missing("name"))?,
            description: self.description.ok_or_else(|| missing("description"))?,
            schema: self.schema.unwrap_or_else(|| crate::ToolSchema::new().build()),
            execute_fn: self.execute_fn.ok_or_else(|| missing("body"))?,
        })
    }
}

impl<T> Default for FunctionToolBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
