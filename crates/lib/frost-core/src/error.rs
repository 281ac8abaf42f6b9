use std::{error::Error, fmt};

use frost_warehouse::WarehouseError;

/// Failures surfaced by catalog and executor operations.
#[derive(Debug)]
pub enum CoreError {
    /// Missing or malformed input, e.g. a qualified name without three parts.
    InvalidArgument(String),
    /// The named database, schema, or table is excluded or does not exist.
    NotFound(String),
    /// A write-gated operation was invoked while write mode is off.
    PermissionDenied(String),
    /// The warehouse rejected the statement; its message is carried verbatim.
    Warehouse(WarehouseError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::PermissionDenied(message) => write!(f, "permission denied: {message}"),
            Self::Warehouse(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {}

impl From<WarehouseError> for CoreError {
    fn from(err: WarehouseError) -> Self {
        Self::Warehouse(err)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
