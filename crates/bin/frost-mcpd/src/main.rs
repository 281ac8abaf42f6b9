//! Daemon entry point for the frost warehouse MCP server.
//!
//! Resolves connection parameters and server options from flags, environment
//! variables, and an optional TOML connections file, then serves the MCP
//! protocol over stdio (default) or streamable HTTP.

mod config;

use std::sync::Arc;

use frost_mcp::FrostMcp;
use frost_mcp::server::{self, HttpServerConfig};
use frost_warehouse::SnowflakeRestClient;
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = DaemonConfig::from_args()?;
    init_tracing(&config.log_level);

    let warehouse = Arc::new(SnowflakeRestClient::new(config.connection.clone()));
    let service = FrostMcp::new(warehouse, &config.options)?;

    match config.http_addr {
        Some(addr) => {
            tracing::info!(%addr, "serving MCP over streamable HTTP");
            server::serve_streamable_http(service, HttpServerConfig::new(addr)).await?;
        }
        None => server::serve_stdio(service).await?,
    }
    Ok(())
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
