//! `/execute`: hand editor code to the interpreter.

use crate::config::AppState;
use crate::console::ExecuteOutcome;
use crate::http::{self, HttpResponse};
use crate::logger;
use hyper::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    code: String,
}

pub async fn execute(state: &AppState, body: &[u8]) -> HttpResponse {
    let outcome = match serde_json::from_slice::<ExecuteRequest>(body) {
        Ok(request) => state.console.execute(request.code).await,
        Err(e) => ExecuteOutcome::Error(format!("invalid request: {e}")),
    };
    if let ExecuteOutcome::Error(ref message) = outcome {
        logger::log_warning(&format!("Execution failed: {message}"));
    }
    http::build_json_response(StatusCode::OK, &outcome)
}
