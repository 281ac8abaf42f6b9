//! Read-only catalog access with exclusion filtering.
//!
//! All four operations delegate the raw listing to the warehouse capability
//! (via `information_schema` queries) and filter the result through the
//! configured [`ExclusionRules`]. Existence checks go through the filtered
//! listings, so an excluded name and a missing one both surface as
//! `NotFound`, never as an empty success.

use std::sync::Arc;

use frost_warehouse::{Row, Warehouse};
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::executor::rows_from;
use crate::filter::{ExclusionRules, NameLevel};
use crate::name::QualifiedName;

/// One table entry from a schema listing.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One column entry from a table description.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Catalog accessor over one warehouse connection.
pub struct Catalog {
    warehouse: Arc<dyn Warehouse>,
    rules: ExclusionRules,
}

impl Catalog {
    #[must_use]
    pub fn new(warehouse: Arc<dyn Warehouse>, rules: ExclusionRules) -> Self {
        Self { warehouse, rules }
    }

    /// Lists all non-excluded database names.
    ///
    /// # Errors
    /// Returns `CoreError::Warehouse` when the metadata query fails.
    pub async fn list_databases(&self) -> CoreResult<Vec<String>> {
        let statement =
            "SELECT database_name FROM snowflake.information_schema.databases ORDER BY database_name";
        let rows = rows_from(self.warehouse.execute(statement).await?);
        Ok(rows
            .iter()
            .filter_map(|row| column_str(row, "database_name"))
            .filter(|name| !self.rules.excludes(NameLevel::Database, name))
            .collect())
    }

    /// Lists non-excluded schema names in a database.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` when the database is excluded or does
    /// not exist, `CoreError::Warehouse` when a metadata query fails.
    pub async fn list_schemas(&self, database: &str) -> CoreResult<Vec<String>> {
        let databases = self.list_databases().await?;
        if !contains_ignore_case(&databases, database) {
            return Err(CoreError::NotFound(format!(
                "database '{database}' not found"
            )));
        }

        let statement = format!(
            "SELECT schema_name FROM {database}.information_schema.schemata ORDER BY schema_name"
        );
        let rows = rows_from(self.warehouse.execute(&statement).await?);
        Ok(rows
            .iter()
            .filter_map(|row| column_str(row, "schema_name"))
            .filter(|name| !self.rules.excludes(NameLevel::Schema, name))
            .collect())
    }

    /// Lists non-excluded tables in a schema.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` when the database or schema is excluded
    /// or missing, `CoreError::Warehouse` when a metadata query fails.
    pub async fn list_tables(&self, database: &str, schema: &str) -> CoreResult<Vec<TableInfo>> {
        let schemas = self.list_schemas(database).await?;
        if !contains_ignore_case(&schemas, schema) {
            return Err(CoreError::NotFound(format!(
                "schema '{database}.{schema}' not found"
            )));
        }

        let statement = format!(
            "SELECT table_name, table_type, comment \
             FROM {database}.information_schema.tables \
             WHERE table_schema ILIKE '{schema}' ORDER BY table_name"
        );
        let rows = rows_from(self.warehouse.execute(&statement).await?);
        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = column_str(row, "table_name")?;
                Some(TableInfo {
                    kind: column_str(row, "table_type")
                        .unwrap_or_else(|| "BASE TABLE".to_string()),
                    comment: column_str(row, "comment"),
                    name,
                })
            })
            .filter(|table| !self.rules.excludes(NameLevel::Table, &table.name))
            .collect())
    }

    /// Describes the columns of a fully-qualified table.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` when the name is not a full
    /// `database.schema.table`, `CoreError::NotFound` when any level is
    /// excluded or missing.
    pub async fn describe_table(&self, name: &QualifiedName) -> CoreResult<Vec<ColumnInfo>> {
        let (Some(schema), Some(table)) = (name.schema.as_deref(), name.table.as_deref()) else {
            return Err(CoreError::InvalidArgument(format!(
                "'{name}' is not a fully qualified table name"
            )));
        };
        if !self.rules.is_visible(name) {
            return Err(CoreError::NotFound(format!("table '{name}' not found")));
        }

        let tables = self.list_tables(&name.database, schema).await?;
        if !tables
            .iter()
            .any(|info| info.name.eq_ignore_ascii_case(table))
        {
            return Err(CoreError::NotFound(format!("table '{name}' not found")));
        }

        let statement = format!(
            "SELECT column_name, data_type, is_nullable, column_default, comment \
             FROM {}.information_schema.columns \
             WHERE table_schema ILIKE '{schema}' AND table_name ILIKE '{table}' \
             ORDER BY ordinal_position",
            name.database
        );
        let rows = rows_from(self.warehouse.execute(&statement).await?);
        let columns: Vec<ColumnInfo> = rows
            .iter()
            .filter_map(|row| {
                Some(ColumnInfo {
                    name: column_str(row, "column_name")?,
                    data_type: column_str(row, "data_type").unwrap_or_default(),
                    nullable: column_str(row, "is_nullable")
                        .is_some_and(|value| value.eq_ignore_ascii_case("yes")),
                    default: column_str(row, "column_default"),
                    comment: column_str(row, "comment"),
                })
            })
            .collect();
        if columns.is_empty() {
            return Err(CoreError::NotFound(format!("table '{name}' not found")));
        }
        Ok(columns)
    }
}

/// Case-insensitive column lookup; the warehouse reports metadata column
/// names in upper case.
fn column_str(row: &Row, column: &str) -> Option<String> {
    row.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(column))
        .and_then(|(_, value)| match value {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn contains_ignore_case(names: &[String], wanted: &str) -> bool {
    names.iter().any(|name| name.eq_ignore_ascii_case(wanted))
}
