//! MCP surface for the frost warehouse adapter.
//!
//! This crate wires the core catalog, executor, and memo into an rmcp
//! [`ServerHandler`]: a hand-built tool registry (the tool set is filtered by
//! runtime configuration, so the compile-time router macros do not fit),
//! plus the memo and per-table resources.

mod helpers;
mod resources;
mod tools;
pub mod server;

use std::sync::Arc;

use frost_core::catalog::Catalog;
use frost_core::executor::QueryExecutor;
use frost_core::filter::{ExclusionRules, PatternError};
use frost_core::memo::InsightMemo;
use frost_core::name::QualifiedName;
use frost_core::options::ServerOptions;
use frost_warehouse::Warehouse;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ReadResourceRequestParams, ReadResourceResult, ResourceContents, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};

pub use tools::{ToolKind, ToolRegistry, ToolSpec};

const SERVER_INSTRUCTIONS: &str = r"frost-mcp exposes a Snowflake data warehouse for analysis.

Workflow:
1. Explore the catalog with `list_databases`, `list_schemas`, and
   `list_tables`; inspect columns with `describe_table` (expects a fully
   qualified `database.schema.table` name). When the server runs with
   prefetch enabled these two tools are replaced by one readable
   `context://table/...` resource per table.
2. Run analysis with `read_query`. Statements are sent to the warehouse
   verbatim; keep them read-only.
3. Record findings as you go with `append_insight`. The running memo is
   readable at the `memo://insights` resource and grows monotonically for
   the lifetime of the server.
4. `write_query` and `create_table` exist but are rejected unless the server
   was started with write mode enabled.

Names hidden by the operator's exclusion patterns are invisible to every
tool and resource; they surface as 'not found'.";

/// The MCP service: one shared state handle, cheap to clone per session.
#[derive(Clone)]
pub struct FrostMcp {
    state: Arc<ServerState>,
}

struct ServerState {
    registry: ToolRegistry,
    catalog: Catalog,
    executor: QueryExecutor,
    memo: InsightMemo,
    prefetch: bool,
    allow_write: bool,
}

impl FrostMcp {
    /// Builds the service: compiles exclusion patterns and applies the
    /// excluded-tool configuration. The resulting tool set and write-mode
    /// flag are immutable for the process lifetime.
    ///
    /// # Errors
    /// Returns `PatternError` when an exclusion pattern is not a valid glob.
    pub fn new(warehouse: Arc<dyn Warehouse>, options: &ServerOptions) -> Result<Self, PatternError> {
        let rules = ExclusionRules::compile(&options.exclusions)?;
        let registry = ToolRegistry::from_options(options);
        Ok(Self {
            state: Arc::new(ServerState {
                registry,
                catalog: Catalog::new(warehouse.clone(), rules),
                executor: QueryExecutor::new(warehouse, options.allow_write),
                memo: InsightMemo::new(),
                prefetch: options.prefetch,
                allow_write: options.allow_write,
            }),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.state.registry
    }

    /// Routes one tool call: unknown tool, then argument validation, then the
    /// write gate, then execution. No SQL is issued for a call rejected by
    /// any of the first three steps.
    ///
    /// # Errors
    /// Returns `ErrorData` for protocol-level failures (unknown tool, bad
    /// arguments, missing catalog names); operational failures come back as
    /// tool-level error results.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let Some(spec) = self.state.registry.lookup(name) else {
            return Err(helpers::mcp_err(
                ErrorCode::METHOD_NOT_FOUND,
                format!("unknown tool: {name}"),
            ));
        };
        let args = arguments.unwrap_or_default();
        tracing::debug!(tool = spec.name, "dispatching tool call");

        match spec.kind {
            ToolKind::ReadQuery => {
                let query = helpers::require_str(&args, "query")?;
                match self.state.executor.read(query).await {
                    Ok(rows) => {
                        let row_count = rows.len();
                        helpers::json_success(&serde_json::json!({
                            "rows": rows,
                            "row_count": row_count,
                        }))
                    }
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::WriteQuery => {
                let query = helpers::require_str(&args, "query")?;
                if let Some(denied) = self.write_gate(spec) {
                    return Ok(denied);
                }
                match self.state.executor.write(query).await {
                    Ok(count) => helpers::json_success(&serde_json::json!({
                        "rows_affected": count,
                    })),
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::CreateTable => {
                let query = helpers::require_str(&args, "query")?;
                if let Some(denied) = self.write_gate(spec) {
                    return Ok(denied);
                }
                match self.state.executor.create_table(query).await {
                    Ok(()) => Ok(CallToolResult::success(vec![Content::text(
                        "Statement executed successfully.",
                    )])),
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::ListDatabases => match self.state.catalog.list_databases().await {
                Ok(databases) => helpers::json_success(&databases),
                Err(err) => helpers::core_failure(err),
            },
            ToolKind::ListSchemas => {
                let database = helpers::require_str(&args, "database")?;
                match self.state.catalog.list_schemas(database).await {
                    Ok(schemas) => helpers::json_success(&schemas),
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::ListTables => {
                let database = helpers::require_str(&args, "database")?;
                let schema = helpers::require_str(&args, "schema")?;
                match self.state.catalog.list_tables(database, schema).await {
                    Ok(tables) => helpers::json_success(&tables),
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::DescribeTable => {
                let raw = helpers::require_str(&args, "table_name")?;
                let name = match QualifiedName::parse_table(raw) {
                    Ok(name) => name,
                    Err(err) => return helpers::core_failure(err),
                };
                match self.state.catalog.describe_table(&name).await {
                    Ok(columns) => helpers::json_success(&columns),
                    Err(err) => helpers::core_failure(err),
                }
            }
            ToolKind::AppendInsight => {
                let insight = helpers::require_str(&args, "insight")?;
                self.state.memo.append(insight).await;
                Ok(CallToolResult::success(vec![Content::text(
                    "Insight recorded.",
                )]))
            }
        }
    }

    fn write_gate(&self, spec: &ToolSpec) -> Option<CallToolResult> {
        if spec.write_gated && !self.state.allow_write {
            return Some(CallToolResult::error(vec![Content::text(format!(
                "tool '{}' requires write mode; the server was started without --allow-write",
                spec.name
            ))]));
        }
        None
    }
}

impl ServerHandler for FrostMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "frost-mcp".to_string(),
                title: Some("Frost Warehouse MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                meta: None,
                tools: self.state.registry.definitions(),
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move { self.dispatch(&request.name, request.arguments).await }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, ErrorData>> + Send + '_ {
        async move {
            Ok(ListResourcesResult {
                meta: None,
                resources: self.list_resource_descriptors().await,
                next_cursor: None,
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, ErrorData>> + Send + '_ {
        async move {
            let text = self.read_resource_text(&request.uri).await?;
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: request.uri.clone(),
                    mime_type: Some("text/plain".to_string()),
                    text,
                    meta: None,
                }],
            })
        }
    }
}
