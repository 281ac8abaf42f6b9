//! Statement execution against the warehouse capability.

use std::sync::Arc;

use frost_warehouse::{QueryResult, Row, Warehouse};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Executes caller-supplied SQL against the warehouse.
///
/// Statement text is passed through verbatim; there is no keyword parsing and
/// no injection defense beyond what the warehouse provides. That is a
/// deliberate trust boundary: the read/write split is enforced by tool
/// routing and the write-mode flag, not by inspecting SQL.
pub struct QueryExecutor {
    warehouse: Arc<dyn Warehouse>,
    allow_write: bool,
}

impl QueryExecutor {
    #[must_use]
    pub fn new(warehouse: Arc<dyn Warehouse>, allow_write: bool) -> Self {
        Self {
            warehouse,
            allow_write,
        }
    }

    #[must_use]
    pub const fn write_enabled(&self) -> bool {
        self.allow_write
    }

    /// Runs a read statement and returns its rows.
    ///
    /// The statement is not checked to actually be a read; the contract is
    /// advisory. A DML result is folded into a single `rows_affected` row.
    ///
    /// # Errors
    /// Returns `CoreError::Warehouse` when the warehouse rejects the
    /// statement.
    pub async fn read(&self, statement: &str) -> CoreResult<Vec<Row>> {
        tracing::debug!(statement, "executing read statement");
        match self.warehouse.execute(statement).await? {
            QueryResult::Rows(rows) => Ok(rows),
            QueryResult::Affected(count) => {
                let mut row = Row::new();
                row.insert("rows_affected".to_string(), Value::from(count));
                Ok(vec![row])
            }
        }
    }

    /// Runs a write statement and returns the affected-row count.
    ///
    /// # Errors
    /// Returns `CoreError::PermissionDenied` while write mode is off,
    /// `CoreError::Warehouse` when the warehouse rejects the statement.
    pub async fn write(&self, statement: &str) -> CoreResult<u64> {
        self.require_write_mode()?;
        match self.warehouse.execute(statement).await? {
            QueryResult::Affected(count) => Ok(count),
            QueryResult::Rows(rows) => Ok(affected_from_rows(&rows)),
        }
    }

    /// Runs a DDL statement.
    ///
    /// # Errors
    /// Returns `CoreError::PermissionDenied` while write mode is off,
    /// `CoreError::Warehouse` when the warehouse rejects the statement.
    pub async fn create_table(&self, statement: &str) -> CoreResult<()> {
        self.require_write_mode()?;
        self.warehouse.execute(statement).await?;
        Ok(())
    }

    fn require_write_mode(&self) -> CoreResult<()> {
        if self.allow_write {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(
                "write mode is disabled; restart the server with --allow-write to enable \
                 mutating statements"
                    .to_string(),
            ))
        }
    }
}

/// Flattens either result variant into rows, for callers that only consume
/// row sets (catalog listings).
pub(crate) fn rows_from(result: QueryResult) -> Vec<Row> {
    match result {
        QueryResult::Rows(rows) => rows,
        QueryResult::Affected(_) => Vec::new(),
    }
}

/// DML acknowledgements sometimes arrive as a one-row result like
/// `{"number of rows inserted": 3}`; the first numeric cell is the count.
fn affected_from_rows(rows: &[Row]) -> u64 {
    rows.first()
        .and_then(|row| row.values().find_map(Value::as_u64))
        .unwrap_or(0)
}
