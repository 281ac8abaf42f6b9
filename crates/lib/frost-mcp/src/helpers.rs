use std::borrow::Cow;

use frost_core::error::CoreError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode, JsonObject};
use serde::Serialize;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Extracts a required non-empty string argument.
pub(crate) fn require_str<'a>(args: &'a JsonObject, name: &str) -> Result<&'a str, ErrorData> {
    match args.get(name) {
        Some(value) => value
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                mcp_err(
                    ErrorCode::INVALID_PARAMS,
                    format!("argument '{name}' must be a non-empty string"),
                )
            }),
        None => Err(mcp_err(
            ErrorCode::INVALID_PARAMS,
            format!("missing required argument: {name}"),
        )),
    }
}

pub(crate) fn json_success<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::json(value)?]))
}

/// Maps a core failure onto the protocol boundary: malformed input and
/// missing names are protocol errors, operational failures become tool-level
/// error results with the warehouse message carried verbatim.
pub(crate) fn core_failure(err: CoreError) -> Result<CallToolResult, ErrorData> {
    match err {
        CoreError::InvalidArgument(message) => Err(mcp_err(ErrorCode::INVALID_PARAMS, message)),
        CoreError::NotFound(message) => Err(mcp_err(ErrorCode::RESOURCE_NOT_FOUND, message)),
        CoreError::PermissionDenied(message) => {
            Ok(CallToolResult::error(vec![Content::text(message)]))
        }
        CoreError::Warehouse(err) => Ok(CallToolResult::error(vec![Content::text(
            err.to_string(),
        )])),
    }
}
