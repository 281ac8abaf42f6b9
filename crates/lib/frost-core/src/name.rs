use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A hierarchical catalog identifier: database, optionally narrowed to a
/// schema, optionally narrowed to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub database: String,
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl QualifiedName {
    #[must_use]
    pub fn database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: None,
            table: None,
        }
    }

    #[must_use]
    pub fn schema(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: Some(schema.into()),
            table: None,
        }
    }

    #[must_use]
    pub fn table(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: Some(schema.into()),
            table: Some(table.into()),
        }
    }

    /// Parses a strict three-part `database.schema.table` name.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` unless the input has exactly
    /// three non-empty dot-separated parts.
    pub fn parse_table(raw: &str) -> CoreResult<Self> {
        let mut parts = raw.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(database), Some(schema), Some(table), None)
                if !database.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Ok(Self::table(database, schema, table))
            }
            _ => Err(CoreError::InvalidArgument(format!(
                "table name must be fully qualified as database.schema.table, got '{raw}'"
            ))),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.database)?;
        if let Some(schema) = &self.schema {
            write!(f, ".{schema}")?;
        }
        if let Some(table) = &self.table {
            write!(f, ".{table}")?;
        }
        Ok(())
    }
}
