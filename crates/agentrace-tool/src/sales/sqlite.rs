use super::store::{QueryRows, SalesStore};
use agentrace_core::{Error, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;

/// Sales table stored in SQLite.
///
/// Queries only ever read: every connection used for a query runs with
/// `PRAGMA query_only`, so a statement that slips past the prefix check
/// (a data-modifying CTE, say) is refused by SQLite itself.
#[derive(Debug, Clone)]
pub struct SqliteSalesStore {
    pool: SqlitePool,
    table: String,
    row_limit: usize,
}

impl SqliteSalesStore {
    pub async fn connect(url: &str, table: impl Into<String>, row_limit: usize) -> Result<Self> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::config_error(format!("Invalid database url {url}: {e}")))?
            .read_only(!in_memory)
            .pragma("query_only", "ON");

        // Every connection to an in-memory database sees its own empty database
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to connect to SQLite: {}", e)))?;

        tracing::debug!(url, "Connected to sales database");
        Ok(Self::from_pool(pool, table, row_limit))
    }

    /// Wrap an existing pool; queries still switch each connection they
    /// use to `query_only`
    pub fn from_pool(pool: SqlitePool, table: impl Into<String>, row_limit: usize) -> Self {
        Self {
            pool,
            table: table.into(),
            row_limit: row_limit.max(1),
        }
    }
}

#[async_trait]
impl SalesStore for SqliteSalesStore {
    fn table(&self) -> &str {
        &self.table
    }

    async fn columns(&self) -> Result<Vec<String>> {
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                .bind(&self.table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| Error::Other(anyhow::anyhow!("Column lookup failed: {}", e)))?;

        if columns.is_empty() {
            return Err(Error::Other(anyhow::anyhow!(
                "Table '{}' does not exist",
                self.table
            )));
        }
        Ok(columns)
    }

    #[tracing::instrument(name = "sales_store.query", skip(self), fields(table = %self.table))]
    async fn query(&self, sql: &str) -> Result<QueryRows> {
        let sql = ensure_read_only(sql)?;
        let query_failed = |e: sqlx::Error| Error::Other(anyhow::anyhow!("Query failed: {}", e));

        let mut conn = self.pool.acquire().await.map_err(query_failed)?;
        sqlx::query("PRAGMA query_only = ON")
            .execute(&mut *conn)
            .await
            .map_err(query_failed)?;

        let statement = (&mut *conn)
            .prepare(sql.as_str())
            .await
            .map_err(query_failed)?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows: Vec<SqliteRow> = sqlx::query(&sql)
            .fetch(&mut *conn)
            .take(self.row_limit)
            .try_collect()
            .await
            .map_err(query_failed)?;

        let rows = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| cell_to_string(row, i))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to read row: {}", e)))?;

        tracing::debug!(rows = rows.len(), "Sales query finished");
        Ok(QueryRows { columns, rows })
    }
}

/// Reject anything that is not a single SELECT/WITH statement up front, with
/// a message the model can act on. A trailing semicolon is dropped.
fn ensure_read_only(sql: &str) -> Result<String> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    let upper = trimmed.to_uppercase();

    if !(upper.starts_with("SELECT") || upper.starts_with("WITH")) {
        return Err(Error::Other(anyhow::anyhow!(
            "Only SELECT queries are allowed, got: {}",
            trimmed
        )));
    }
    if trimmed.contains(';') {
        return Err(Error::Other(anyhow::anyhow!(
            "Only a single statement is allowed"
        )));
    }
    Ok(trimmed.to_string())
}

/// Render one cell the way it is stored: integers, reals, text, NULL
fn cell_to_string(row: &SqliteRow, index: usize) -> std::result::Result<String, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok("NULL".to_string());
    }

    let type_name = raw.type_info().name().to_ascii_uppercase();
    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index).map(|v| v.to_string()),
        "REAL" => row.try_get_unchecked::<f64, _>(index).map(|v| v.to_string()),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(|v| format!("<{} bytes>", v.len())),
        _ => row.try_get_unchecked::<String, _>(index),
    }
}
