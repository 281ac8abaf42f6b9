//! The tool registry: the fixed tool table, startup filtering, and the JSON
//! input schemas advertised to callers.

use std::sync::Arc;

use frost_core::options::ServerOptions;
use rmcp::model::{JsonObject, Tool, object};
use serde_json::json;

/// Operation a tool name routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ReadQuery,
    WriteQuery,
    CreateTable,
    ListDatabases,
    ListSchemas,
    ListTables,
    DescribeTable,
    AppendInsight,
}

/// One entry of the fixed tool table.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub write_gated: bool,
}

const BASE_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        kind: ToolKind::ReadQuery,
        name: "read_query",
        description: "Execute a SELECT query against the warehouse and return the matching rows.",
        write_gated: false,
    },
    ToolSpec {
        kind: ToolKind::WriteQuery,
        name: "write_query",
        description: "Execute an INSERT, UPDATE, or DELETE statement and return the affected-row count. Requires write mode.",
        write_gated: true,
    },
    ToolSpec {
        kind: ToolKind::CreateTable,
        name: "create_table",
        description: "Execute a CREATE TABLE statement. Requires write mode.",
        write_gated: true,
    },
    ToolSpec {
        kind: ToolKind::ListDatabases,
        name: "list_databases",
        description: "List all visible databases.",
        write_gated: false,
    },
    ToolSpec {
        kind: ToolKind::ListSchemas,
        name: "list_schemas",
        description: "List all visible schemas in a database.",
        write_gated: false,
    },
    ToolSpec {
        kind: ToolKind::ListTables,
        name: "list_tables",
        description: "List all visible tables in a schema, with table kind and comment.",
        write_gated: false,
    },
    ToolSpec {
        kind: ToolKind::DescribeTable,
        name: "describe_table",
        description: "Show column metadata for a fully qualified table (database.schema.table).",
        write_gated: false,
    },
    ToolSpec {
        kind: ToolKind::AppendInsight,
        name: "append_insight",
        description: "Record a data insight in the running analysis memo resource.",
        write_gated: false,
    },
];

/// Tool table after startup filtering. A removed tool stays unreachable for
/// the process lifetime; nothing can re-register it.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Builds the registry from the fixed table, dropping excluded tool names
    /// and, when prefetch is on, the two tools whose content is served as
    /// resources instead.
    #[must_use]
    pub fn from_options(options: &ServerOptions) -> Self {
        let mut excluded: Vec<&str> = options
            .exclude_tools
            .iter()
            .map(String::as_str)
            .collect();
        if options.prefetch {
            excluded.push("list_tables");
            excluded.push("describe_table");
        }
        let specs = BASE_TOOLS
            .iter()
            .filter(|spec| !excluded.iter().any(|name| name.eq_ignore_ascii_case(spec.name)))
            .copied()
            .collect();
        Self { specs }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Tool definitions for `tools/list`, schemas included.
    #[must_use]
    pub fn definitions(&self) -> Vec<Tool> {
        self.specs
            .iter()
            .map(|spec| Tool::new(spec.name, spec.description, input_schema(spec.kind)))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn input_schema(kind: ToolKind) -> Arc<JsonObject> {
    match kind {
        ToolKind::ReadQuery | ToolKind::WriteQuery | ToolKind::CreateTable => query_schema(),
        ToolKind::ListDatabases => empty_schema(),
        ToolKind::ListSchemas => database_schema(),
        ToolKind::ListTables => schema_schema(),
        ToolKind::DescribeTable => table_name_schema(),
        ToolKind::AppendInsight => insight_schema(),
    }
}

fn query_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "SQL statement to execute" }
        },
        "required": ["query"]
    })))
}

fn empty_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {},
        "required": []
    })))
}

fn database_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "database": { "type": "string", "description": "Database name" }
        },
        "required": ["database"]
    })))
}

fn schema_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "database": { "type": "string", "description": "Database name" },
            "schema": { "type": "string", "description": "Schema name" }
        },
        "required": ["database", "schema"]
    })))
}

fn table_name_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "table_name": {
                "type": "string",
                "description": "Fully qualified table name: database.schema.table"
            }
        },
        "required": ["table_name"]
    })))
}

fn insight_schema() -> Arc<JsonObject> {
    Arc::new(object(json!({
        "type": "object",
        "properties": {
            "insight": { "type": "string", "description": "Insight text to record" }
        },
        "required": ["insight"]
    })))
}
