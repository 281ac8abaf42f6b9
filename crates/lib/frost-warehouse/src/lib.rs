//! Warehouse capability for frost-mcp.
//!
//! The [`Warehouse`] trait is the seam between the protocol adapter and the
//! actual data warehouse: a single opaque operation that accepts SQL text and
//! returns rows or an affected-row count. [`SnowflakeRestClient`] is the
//! production implementation, speaking Snowflake's SQL REST API.

mod rest;
mod types;

pub use rest::{ConnectionParams, SnowflakeRestClient, TokenType};
pub use types::{QueryResult, Row};

use std::{error::Error, fmt};

use async_trait::async_trait;

#[derive(Debug)]
pub enum WarehouseError {
    Transport(Box<reqwest::Error>),
    Api {
        code: Option<String>,
        message: String,
    },
    Decode(String),
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Api {
                code: Some(code),
                message,
            } => write!(f, "warehouse rejected statement ({code}): {message}"),
            Self::Api {
                code: None,
                message,
            } => write!(f, "warehouse rejected statement: {message}"),
            Self::Decode(message) => write!(f, "malformed warehouse response: {message}"),
        }
    }
}

impl Error for WarehouseError {}

impl From<reqwest::Error> for WarehouseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// An opaque SQL-executing capability.
///
/// Implementations must pass statement text through verbatim and surface the
/// warehouse's own error message unmodified. Retries, pooling, and transaction
/// management are deliberately out of scope.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Executes a single SQL statement and returns its result.
    ///
    /// # Errors
    /// Returns `WarehouseError` when the warehouse rejects the statement or
    /// the response cannot be decoded.
    async fn execute(&self, statement: &str) -> WarehouseResult<QueryResult>;
}
