//! Buffer endpoints: `/save` and `/text_files`.

use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger;
use hyper::StatusCode;
use serde_json::Value;

pub const STATUS_OK: &str = "OK";
pub const STATUS_FAILED: &str = "FAILED";

/// Persist a `name -> content` JSON object. The whole batch answers
/// `OK` or `FAILED`; which file failed is only logged.
pub async fn save_buffers(state: &AppState, body: &[u8]) -> HttpResponse {
    let status = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(buffers)) => match state.store.save_buffers(&buffers).await {
            Ok(count) => {
                logger::log_debug(&format!("Saved {count} buffer(s)"));
                STATUS_OK
            }
            Err(e) => {
                logger::log_error(&format!("Failed to save buffers: {e}"));
                STATUS_FAILED
            }
        },
        Ok(other) => {
            logger::log_warning(&format!(
                "Save request is not a JSON object: {}",
                json_kind(&other)
            ));
            STATUS_FAILED
        }
        Err(e) => {
            logger::log_warning(&format!("Save request is not valid JSON: {e}"));
            STATUS_FAILED
        }
    };
    http::build_text_response(StatusCode::OK, status)
}

/// Every `.py` buffer with its content
pub async fn text_files(state: &AppState) -> HttpResponse {
    match state.store.list_text_files().await {
        Ok(files) => http::build_json_response(StatusCode::OK, &files),
        Err(e) => {
            logger::log_error(&format!("Failed to list buffers: {e}"));
            http::build_json_response(
                StatusCode::OK,
                &serde_json::json!({ "error": e.to_string() }),
            )
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
