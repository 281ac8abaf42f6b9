use serde_json::Value;

/// A single result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// The outcome of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// An ordered row set, produced by SELECT-like statements.
    Rows(Vec<Row>),
    /// The number of rows touched by a DML statement.
    Affected(u64),
}

impl QueryResult {
    #[must_use]
    pub const fn empty() -> Self {
        Self::Rows(Vec::new())
    }
}
