//! Dispatch and resource behavior against a spy warehouse.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use frost_core::filter::ExclusionPatterns;
use frost_core::options::ServerOptions;
use frost_mcp::FrostMcp;
use frost_warehouse::{QueryResult, Row, Warehouse, WarehouseError, WarehouseResult};
use rmcp::model::{ErrorCode, JsonObject};
use serde_json::{Value, json};

/// Records every statement it receives and replays canned results keyed by a
/// statement fragment; statements with no script entry return an empty row
/// set.
struct SpyWarehouse {
    responses: Vec<(&'static str, QueryResult)>,
    log: Mutex<Vec<String>>,
}

impl SpyWarehouse {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            responses: Vec::new(),
            log: Mutex::new(Vec::new()),
        })
    }

    fn scripted(responses: Vec<(&'static str, QueryResult)>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            log: Mutex::new(Vec::new()),
        })
    }

    fn statements(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }
}

#[async_trait]
impl Warehouse for SpyWarehouse {
    async fn execute(&self, statement: &str) -> WarehouseResult<QueryResult> {
        self.log.lock().expect("log lock").push(statement.to_string());
        let lowered = statement.to_ascii_lowercase();
        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| lowered.contains(&fragment.to_ascii_lowercase()))
            .map_or_else(QueryResult::empty, |(_, result)| result.clone()))
    }
}

fn args(pairs: &[(&str, &str)]) -> Option<JsonObject> {
    let mut object = JsonObject::new();
    for (key, value) in pairs {
        object.insert((*key).to_string(), Value::from(*value));
    }
    Some(object)
}

fn service(warehouse: Arc<SpyWarehouse>, options: &ServerOptions) -> FrostMcp {
    FrostMcp::new(warehouse, options).expect("service builds")
}

fn catalog_script() -> Vec<(&'static str, QueryResult)> {
    let row = |column: &str, value: &str| {
        let mut row = Row::new();
        row.insert(column.to_string(), Value::from(value));
        row
    };
    vec![
        (
            "information_schema.databases",
            QueryResult::Rows(vec![row("DATABASE_NAME", "ANALYTICS")]),
        ),
        (
            "information_schema.schemata",
            QueryResult::Rows(vec![row("SCHEMA_NAME", "PUBLIC")]),
        ),
        (
            "information_schema.tables",
            QueryResult::Rows(vec![{
                let mut table = Row::new();
                table.insert("TABLE_NAME".to_string(), Value::from("ORDERS"));
                table.insert("TABLE_TYPE".to_string(), Value::from("BASE TABLE"));
                table.insert("COMMENT".to_string(), Value::from("order facts"));
                table
            }]),
        ),
        (
            "information_schema.columns",
            QueryResult::Rows(vec![{
                let mut column = Row::new();
                column.insert("COLUMN_NAME".to_string(), Value::from("ID"));
                column.insert("DATA_TYPE".to_string(), Value::from("NUMBER"));
                column.insert("IS_NULLABLE".to_string(), Value::from("NO"));
                column.insert("COLUMN_DEFAULT".to_string(), Value::Null);
                column.insert("COMMENT".to_string(), Value::Null);
                column
            }]),
        ),
    ]
}

#[tokio::test]
async fn write_query_without_write_mode_issues_no_sql() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse.clone(), &ServerOptions::default());

    let result = service
        .dispatch("write_query", args(&[("query", "DELETE FROM t")]))
        .await
        .expect("gate failure is a tool-level error");
    assert_eq!(result.is_error, Some(true));
    assert!(warehouse.statements().is_empty(), "no SQL may reach the warehouse");
}

#[tokio::test]
async fn write_query_with_write_mode_reaches_the_warehouse() {
    let warehouse = SpyWarehouse::scripted(vec![("delete from", QueryResult::Affected(2))]);
    let options = ServerOptions::default().with_allow_write(true);
    let service = service(warehouse.clone(), &options);

    let result = service
        .dispatch("write_query", args(&[("query", "DELETE FROM t")]))
        .await
        .expect("write succeeds");
    assert_ne!(result.is_error, Some(true));
    assert_eq!(warehouse.statements(), vec!["DELETE FROM t".to_string()]);
}

#[tokio::test]
async fn excluded_tool_is_unknown() {
    let warehouse = SpyWarehouse::empty();
    let options =
        ServerOptions::default().with_excluded_tools(["append_insight".to_string()]);
    let service = service(warehouse, &options);

    let err = service
        .dispatch("append_insight", args(&[("insight", "x")]))
        .await
        .expect_err("excluded tool");
    assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn unknown_tool_is_rejected() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse, &ServerOptions::default());

    let err = service.dispatch("drop_database", None).await.expect_err("unknown");
    assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn missing_argument_is_invalid_params() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse.clone(), &ServerOptions::default());

    let err = service.dispatch("read_query", None).await.expect_err("missing arg");
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(warehouse.statements().is_empty());
}

#[tokio::test]
async fn malformed_table_name_never_contacts_the_warehouse() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse.clone(), &ServerOptions::default());

    let err = service
        .dispatch("describe_table", args(&[("table_name", "dbXschema")]))
        .await
        .expect_err("malformed name");
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(warehouse.statements().is_empty());
}

#[tokio::test]
async fn read_query_passes_statement_through_verbatim() {
    let statement = "SELECT * FROM analytics.public.orders WHERE total > 10";
    let warehouse = SpyWarehouse::scripted(vec![("select *", QueryResult::empty())]);
    let service = service(warehouse.clone(), &ServerOptions::default());

    let result = service
        .dispatch("read_query", args(&[("query", statement)]))
        .await
        .expect("read succeeds");
    assert_ne!(result.is_error, Some(true));
    assert_eq!(warehouse.statements(), vec![statement.to_string()]);
}

#[tokio::test]
async fn warehouse_rejection_surfaces_as_tool_error() {
    struct FailingWarehouse;

    #[async_trait]
    impl Warehouse for FailingWarehouse {
        async fn execute(&self, _statement: &str) -> WarehouseResult<QueryResult> {
            Err(WarehouseError::Api {
                code: Some("002003".to_string()),
                message: "SQL compilation error: object does not exist".to_string(),
            })
        }
    }

    let service = FrostMcp::new(Arc::new(FailingWarehouse), &ServerOptions::default())
        .expect("service builds");
    let result = service
        .dispatch("read_query", args(&[("query", "SELECT 1")]))
        .await
        .expect("execution failure is a tool-level error");
    assert_eq!(result.is_error, Some(true));
}

#[tokio::test]
async fn memo_appends_are_visible_through_the_resource() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse, &ServerOptions::default());

    let placeholder = service
        .read_resource_text("memo://insights")
        .await
        .expect("memo resource exists");
    assert!(placeholder.contains("No insights recorded yet"));

    service
        .dispatch("append_insight", args(&[("insight", "first finding")]))
        .await
        .expect("append succeeds");
    service
        .dispatch("append_insight", args(&[("insight", "second finding")]))
        .await
        .expect("append succeeds");

    let memo = service
        .read_resource_text("memo://insights")
        .await
        .expect("memo resource exists");
    let first = memo.find("first finding").expect("first insight rendered");
    let second = memo.find("second finding").expect("second insight rendered");
    assert!(first < second);
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse, &ServerOptions::default());

    let err = service
        .read_resource_text("context://table/nope")
        .await
        .expect_err("malformed table uri");
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);

    let err = service
        .read_resource_text("bogus://thing")
        .await
        .expect_err("unknown scheme");
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
}

#[tokio::test]
async fn resource_listing_is_memo_only_without_prefetch() {
    let warehouse = SpyWarehouse::scripted(catalog_script());
    let service = service(warehouse, &ServerOptions::default());

    let resources = service.list_resource_descriptors().await;
    let uris: Vec<String> = resources.iter().map(|r| r.raw.uri.clone()).collect();
    assert_eq!(uris, vec!["memo://insights".to_string()]);
}

#[tokio::test]
async fn prefetch_lists_one_resource_per_visible_table() {
    let warehouse = SpyWarehouse::scripted(catalog_script());
    let options = ServerOptions::default().with_prefetch(true);
    let service = service(warehouse, &options);

    let resources = service.list_resource_descriptors().await;
    let uris: Vec<String> = resources.iter().map(|r| r.raw.uri.clone()).collect();
    assert_eq!(
        uris,
        vec![
            "memo://insights".to_string(),
            "context://table/ANALYTICS.PUBLIC.ORDERS".to_string(),
        ]
    );

    let context = service
        .read_resource_text("context://table/ANALYTICS.PUBLIC.ORDERS")
        .await
        .expect("table resource readable");
    assert!(context.contains("ID NUMBER NOT NULL"));
}

#[tokio::test]
async fn excluded_schema_is_not_found_for_tools() {
    let warehouse = SpyWarehouse::scripted(vec![
        (
            "information_schema.databases",
            QueryResult::Rows(vec![{
                let mut row = Row::new();
                row.insert("DATABASE_NAME".to_string(), Value::from("ANALYTICS"));
                row
            }]),
        ),
        (
            "information_schema.schemata",
            QueryResult::Rows(
                ["PUBLIC", "REPORTING", "TEMP_STAGING"]
                    .iter()
                    .map(|name| {
                        let mut row = Row::new();
                        row.insert("SCHEMA_NAME".to_string(), Value::from(*name));
                        row
                    })
                    .collect(),
            ),
        ),
    ]);
    let options = ServerOptions::default().with_exclusions(ExclusionPatterns {
        databases: Vec::new(),
        schemas: vec!["TEMP*".to_string()],
        tables: Vec::new(),
    });
    let service = service(warehouse, &options);

    let result = service
        .dispatch("list_schemas", args(&[("database", "ANALYTICS")]))
        .await
        .expect("listing succeeds");
    assert_ne!(result.is_error, Some(true));
    let rendered = serde_json::to_string(&result.content).expect("serializable content");
    assert!(rendered.contains("PUBLIC"));
    assert!(rendered.contains("REPORTING"));
    assert!(!rendered.contains("TEMP_STAGING"));

    let err = service
        .dispatch(
            "list_tables",
            args(&[("database", "ANALYTICS"), ("schema", "TEMP_STAGING")]),
        )
        .await
        .expect_err("excluded schema is not found");
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
}

#[tokio::test]
async fn prefetch_retires_table_tools_from_listing() {
    let warehouse = SpyWarehouse::empty();
    let options = ServerOptions::default().with_prefetch(true);
    let service = service(warehouse, &options);

    let names: Vec<&str> = service.registry().names().collect();
    assert!(!names.contains(&"list_tables"));
    assert!(!names.contains(&"describe_table"));
    assert!(names.contains(&"read_query"));

    let err = service
        .dispatch(
            "describe_table",
            args(&[("table_name", "ANALYTICS.PUBLIC.ORDERS")]),
        )
        .await
        .expect_err("retired tool");
    assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn dispatch_is_consistent_under_concurrent_appends() {
    let warehouse = SpyWarehouse::empty();
    let service = service(warehouse, &ServerOptions::default());

    let mut handles = Vec::new();
    for index in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let insight = format!("insight {index}");
            service
                .dispatch("append_insight", args(&[("insight", insight.as_str())]))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task completes").expect("append succeeds");
    }

    let memo = service
        .read_resource_text("memo://insights")
        .await
        .expect("memo readable");
    for index in 0..8 {
        assert!(memo.contains(&format!("insight {index}")));
    }
}

#[test]
fn json_object_helper_builds_arguments() {
    let built = args(&[("query", "SELECT 1")]).expect("some");
    assert_eq!(built.get("query"), Some(&json!("SELECT 1")));
}
