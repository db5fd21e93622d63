//! HTTP protocol layer module
//!
//! Response builders, MIME detection and cache validation, independent of
//! what the handlers do with them.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    allow_any_origin, build_304_response, build_404_response, build_405_response,
    build_413_response, build_event_response, build_json_error, build_json_response,
    build_options_response, build_static_response, build_text_response, with_server_name,
    HttpResponse,
};
