//! Local web server for the Sardine live-coding editor.
//!
//! Serves the browser client, persists editor buffers and settings under a
//! per-user data directory, forwards code to a shared interpreter process and
//! streams the interpreter log back to the browser.

pub mod config;
pub mod console;
pub mod handler;
pub mod http;
pub mod logger;
pub mod repl;
pub mod server;
pub mod store;
