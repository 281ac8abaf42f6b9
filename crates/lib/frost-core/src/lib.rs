//! Core behavior for frost-mcp: exclusion filtering, catalog access, query
//! execution, and the insight memo.
//!
//! Everything here is warehouse-agnostic; SQL execution goes through the
//! [`frost_warehouse::Warehouse`] trait.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod filter;
pub mod memo;
pub mod name;
pub mod options;
