//! Editor config endpoints: `/config` and `/save_config`.

use super::buffers::{STATUS_FAILED, STATUS_OK};
use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger;
use hyper::StatusCode;
use serde_json::Value;

pub async fn get_config(state: &AppState) -> HttpResponse {
    match state.store.read_config().await {
        Ok(config) => http::build_json_response(StatusCode::OK, &config),
        Err(e) => {
            logger::log_error(&format!("Error while reading config.json: {e}"));
            http::build_json_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn save_config(state: &AppState, body: &[u8]) -> HttpResponse {
    let status = match serde_json::from_slice::<Value>(body) {
        Ok(config) => match state.store.write_config(config).await {
            Ok(()) => STATUS_OK,
            Err(e) => {
                logger::log_error(&format!("Failed to write config.json: {e}"));
                STATUS_FAILED
            }
        },
        Err(e) => {
            logger::log_warning(&format!("Config body is not valid JSON: {e}"));
            STATUS_FAILED
        }
    };
    http::build_text_response(StatusCode::OK, status)
}
