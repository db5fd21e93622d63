//! `/log`: unread interpreter output as one Server-Sent-Events message.
//!
//! Each request answers once with whatever was appended since the previous
//! request; the editor polls.

use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger;

pub const EMPTY_EVENT: &str = "data:\n\n";
pub const READ_ERROR_EVENT: &str = "data: An error occured while reading the logfile\n\n";

pub async fn stream_log(state: &AppState) -> HttpResponse {
    let payload = {
        let mut tail = state.log_tail.lock().await;
        match tail.read_unread().await {
            Ok(lines) => frame_event(&lines),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read '{}': {e}",
                    tail.path().display()
                ));
                READ_ERROR_EVENT.to_string()
            }
        }
    };
    http::build_event_response(payload)
}

/// One event, one `data:` field per line
fn frame_event(lines: &[String]) -> String {
    if lines.is_empty() {
        return EMPTY_EVENT.to_string();
    }
    let mut event = String::new();
    for line in lines {
        event.push_str("data:");
        event.push_str(line);
        event.push('\n');
    }
    event.push('\n');
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_event() {
        assert_eq!(frame_event(&[]), "data:\n\n");
        assert_eq!(
            frame_event(&["tick".to_string(), String::new()]),
            "data:tick\ndata:\n\n"
        );
    }
}
