//! Request handler module
//!
//! Route dispatch plus one module per endpoint group: buffers, editor
//! config, code execution, log streaming, folder opening and static files.

pub mod buffers;
pub mod editor_config;
pub mod execute;
pub mod folder;
pub mod log_stream;
pub mod router;
pub mod static_files;

pub use router::handle_request;
