//! `/open_folder`: reveal the data directory in the OS file browser.

use super::buffers::STATUS_OK;
use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger;
use hyper::StatusCode;

pub fn open_folder(state: &AppState) -> HttpResponse {
    let dir = state.store.data_dir();
    if let Err(e) = open::that_detached(dir) {
        logger::log_error(&format!("Failed to open '{}': {e}", dir.display()));
    }
    http::build_text_response(StatusCode::OK, STATUS_OK)
}
