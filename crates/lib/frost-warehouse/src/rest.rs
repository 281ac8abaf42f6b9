//! Snowflake SQL REST API driver.
//!
//! One statement per `POST /api/v2/statements` request. Long-running
//! statements come back as `202 Accepted` with a statement handle that is
//! polled until the result is ready. Cell values arrive as nullable strings
//! plus column type metadata and are decoded into typed JSON values here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value, json};
use uuid::Uuid;

use crate::types::{QueryResult, Row};
use crate::{Warehouse, WarehouseError, WarehouseResult};

const STATEMENTS_PATH: &str = "/api/v2/statements";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How the bearer token should be presented to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenType {
    #[default]
    OAuth,
    ProgrammaticAccessToken,
    KeyPairJwt,
}

impl TokenType {
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::OAuth => "OAUTH",
            Self::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
            Self::KeyPairJwt => "KEYPAIR_JWT",
        }
    }
}

/// Resolved connection parameters for one warehouse account.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Account identifier, e.g. `myorg-myaccount`.
    pub account: String,
    pub user: String,
    pub token: String,
    pub token_type: TokenType,
    pub database: String,
    pub schema: String,
    pub warehouse: Option<String>,
    pub role: Option<String>,
}

/// [`Warehouse`] implementation backed by the Snowflake SQL REST API.
pub struct SnowflakeRestClient {
    http: reqwest::Client,
    base_url: String,
    params: ConnectionParams,
}

impl SnowflakeRestClient {
    #[must_use]
    pub fn new(params: ConnectionParams) -> Self {
        let base_url = format!("https://{}.snowflakecomputing.com", params.account);
        Self {
            http: reqwest::Client::new(),
            base_url,
            params,
        }
    }

    /// Overrides the derived endpoint, e.g. to point at a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn submit(&self, statement: &str) -> WarehouseResult<StatementResponse> {
        let request_id = Uuid::new_v4();
        let url = format!("{}{STATEMENTS_PATH}?requestId={request_id}", self.base_url);
        let body = json!({
            "statement": statement,
            "database": self.params.database,
            "schema": self.params.schema,
            "warehouse": self.params.warehouse,
            "role": self.params.role,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.params.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                self.params.token_type.header_value(),
            )
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let mut parsed = Self::parse_response(response).await?;
        while parsed.pending {
            let Some(handle) = parsed.body.statement_handle.clone() else {
                return Err(WarehouseError::Decode(
                    "202 response without a statement handle".to_string(),
                ));
            };
            tokio::time::sleep(POLL_INTERVAL).await;
            tracing::debug!(handle = %handle, "polling statement status");
            let url = format!("{}{STATEMENTS_PATH}/{handle}", self.base_url);
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.params.token)
                .header(
                    "X-Snowflake-Authorization-Token-Type",
                    self.params.token_type.header_value(),
                )
                .header("Accept", "application/json")
                .send()
                .await?;
            parsed = Self::parse_response(response).await?;
        }
        Ok(parsed.body)
    }

    async fn parse_response(response: reqwest::Response) -> WarehouseResult<ParsedResponse> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            let body: StatementResponse = serde_json::from_str(&text)
                .map_err(|err| WarehouseError::Decode(err.to_string()))?;
            return Ok(ParsedResponse {
                pending: status.as_u16() == 202,
                body,
            });
        }

        // Error payloads carry `code` and `message`; fall back to the raw body.
        let body: Result<StatementResponse, _> = serde_json::from_str(&text);
        match body {
            Ok(StatementResponse {
                code,
                message: Some(message),
                ..
            }) => Err(WarehouseError::Api { code, message }),
            _ => Err(WarehouseError::Api {
                code: None,
                message: format!("HTTP {status}: {text}"),
            }),
        }
    }
}

#[async_trait]
impl Warehouse for SnowflakeRestClient {
    async fn execute(&self, statement: &str) -> WarehouseResult<QueryResult> {
        let body = self.submit(statement).await?;
        decode_result(body)
    }
}

struct ParsedResponse {
    pending: bool,
    body: StatementResponse,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(rename = "resultSetMetaData")]
    metadata: Option<ResultSetMetaData>,
    data: Option<Vec<Vec<Option<String>>>>,
    stats: Option<StatementStats>,
    #[serde(rename = "statementHandle")]
    statement_handle: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultSetMetaData {
    #[serde(rename = "rowType")]
    row_type: Vec<ColumnType>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct StatementStats {
    #[serde(rename = "numRowsInserted")]
    rows_inserted: Option<u64>,
    #[serde(rename = "numRowsUpdated")]
    rows_updated: Option<u64>,
    #[serde(rename = "numRowsDeleted")]
    rows_deleted: Option<u64>,
}

impl StatementStats {
    fn affected(&self) -> Option<u64> {
        match (self.rows_inserted, self.rows_updated, self.rows_deleted) {
            (None, None, None) => None,
            (inserted, updated, deleted) => Some(
                inserted.unwrap_or(0) + updated.unwrap_or(0) + deleted.unwrap_or(0),
            ),
        }
    }
}

fn decode_result(body: StatementResponse) -> WarehouseResult<QueryResult> {
    if let Some(affected) = body.stats.as_ref().and_then(StatementStats::affected) {
        return Ok(QueryResult::Affected(affected));
    }

    let Some(metadata) = body.metadata else {
        return Ok(QueryResult::empty());
    };
    let data = body.data.unwrap_or_default();

    // TODO: fetch additional result partitions; only the first partition of a
    // large result set is decoded today.
    let mut rows = Vec::with_capacity(data.len());
    for cells in data {
        let mut row = Row::new();
        for (column, cell) in metadata.row_type.iter().zip(cells) {
            row.insert(column.name.clone(), decode_cell(&column.column_type, cell));
        }
        rows.push(row);
    }
    Ok(QueryResult::Rows(rows))
}

/// Decodes one string cell according to its column type.
///
/// NULL stays null, `fixed`/`real` become numbers (NaN collapses to null),
/// `boolean` becomes a bool, and everything else (text, dates, timestamps,
/// variants) is kept as the string the warehouse produced.
fn decode_cell(column_type: &str, cell: Option<String>) -> Value {
    let Some(text) = cell else {
        return Value::Null;
    };
    match column_type.to_ascii_lowercase().as_str() {
        "fixed" => text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<f64>().map(finite_number))
            .unwrap_or(Value::String(text)),
        "real" => text
            .parse::<f64>()
            .map(finite_number)
            .unwrap_or(Value::String(text)),
        "boolean" => match text.as_str() {
            "true" | "TRUE" | "1" => Value::Bool(true),
            "false" | "FALSE" | "0" => Value::Bool(false),
            _ => Value::String(text),
        },
        _ => Value::String(text),
    }
}

fn finite_number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
