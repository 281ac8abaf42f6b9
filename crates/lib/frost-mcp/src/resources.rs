//! Resource enumeration and fetch: the insight memo plus, when prefetch is
//! enabled, one text resource per visible table. Table resources are
//! recomputed on every listing; exclusion rules are static but table
//! existence is not.

use std::fmt::Write as _;

use frost_core::catalog::ColumnInfo;
use frost_core::error::{CoreError, CoreResult};
use frost_core::name::QualifiedName;
use rmcp::ErrorData;
use rmcp::model::{AnnotateAble, ErrorCode, RawResource, Resource};

use crate::{FrostMcp, helpers};

pub(crate) const MEMO_URI: &str = "memo://insights";
pub(crate) const TABLE_URI_PREFIX: &str = "context://table/";

impl FrostMcp {
    /// Enumerates addressable resources. The memo is always present; table
    /// descriptors are appended when prefetch is on. Catalog failures during
    /// enumeration degrade to the memo-only listing.
    pub async fn list_resource_descriptors(&self) -> Vec<Resource> {
        let mut resources = vec![memo_descriptor()];
        if self.state.prefetch {
            match self.visible_tables().await {
                Ok(tables) => resources.extend(
                    tables
                        .into_iter()
                        .map(|(name, comment)| table_descriptor(&name, comment)),
                ),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to enumerate table resources");
                }
            }
        }
        resources
    }

    /// Fetches one resource body as text.
    ///
    /// # Errors
    /// Returns `RESOURCE_NOT_FOUND` for unknown URIs and for table resources
    /// whose table is excluded or gone.
    pub async fn read_resource_text(&self, uri: &str) -> Result<String, ErrorData> {
        if uri == MEMO_URI {
            return Ok(self.state.memo.render().await);
        }
        if let Some(rest) = uri.strip_prefix(TABLE_URI_PREFIX) {
            let Ok(name) = QualifiedName::parse_table(rest) else {
                return Err(unknown_resource(uri));
            };
            return match self.state.catalog.describe_table(&name).await {
                Ok(columns) => Ok(format_table_context(&name, &columns)),
                Err(CoreError::NotFound(message)) => {
                    Err(helpers::mcp_err(ErrorCode::RESOURCE_NOT_FOUND, message))
                }
                Err(err) => Err(helpers::mcp_err(
                    ErrorCode::INTERNAL_ERROR,
                    err.to_string(),
                )),
            };
        }
        Err(unknown_resource(uri))
    }

    async fn visible_tables(&self) -> CoreResult<Vec<(QualifiedName, Option<String>)>> {
        let mut tables = Vec::new();
        for database in self.state.catalog.list_databases().await? {
            for schema in self.state.catalog.list_schemas(&database).await? {
                for info in self.state.catalog.list_tables(&database, &schema).await? {
                    tables.push((
                        QualifiedName::table(database.clone(), schema.clone(), info.name),
                        info.comment,
                    ));
                }
            }
        }
        Ok(tables)
    }
}

fn unknown_resource(uri: &str) -> ErrorData {
    helpers::mcp_err(
        ErrorCode::RESOURCE_NOT_FOUND,
        format!("unknown resource: {uri}"),
    )
}

fn memo_descriptor() -> Resource {
    RawResource {
        uri: MEMO_URI.to_string(),
        name: "insights".to_string(),
        title: Some("Insight memo".to_string()),
        description: Some("Running list of insights recorded during analysis".to_string()),
        mime_type: Some("text/plain".to_string()),
        size: None,
        icons: None,
        meta: None,
    }
    .no_annotation()
}

fn table_descriptor(name: &QualifiedName, comment: Option<String>) -> Resource {
    RawResource {
        uri: format!("{TABLE_URI_PREFIX}{name}"),
        name: name.to_string(),
        title: Some(format!("Table: {name}")),
        description: comment.or_else(|| Some("Column metadata and comments".to_string())),
        mime_type: Some("text/plain".to_string()),
        size: None,
        icons: None,
        meta: None,
    }
    .no_annotation()
}

fn format_table_context(name: &QualifiedName, columns: &[ColumnInfo]) -> String {
    let mut text = format!("Table {name}\n\nColumns:\n");
    for column in columns {
        let _ = write!(text, "  {} {}", column.name, column.data_type);
        if !column.nullable {
            text.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            let _ = write!(text, " DEFAULT {default}");
        }
        if let Some(comment) = &column.comment {
            let _ = write!(text, " -- {comment}");
        }
        text.push('\n');
    }
    text
}
