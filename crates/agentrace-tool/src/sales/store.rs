use agentrace_core::Result;
use async_trait::async_trait;

/// Read-only access to the sales table
#[async_trait]
pub trait SalesStore: Send + Sync {
    fn table(&self) -> &str;

    async fn columns(&self) -> Result<Vec<String>>;

    /// Run a read-only query and return every cell as text
    async fn query(&self, sql: &str) -> Result<QueryRows>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryRows {
    /// Header line followed by one line per row, cells joined by ", "
    pub fn render(&self) -> String {
        std::iter::once(self.columns.join(", "))
            .chain(self.rows.iter().map(|row| row.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
