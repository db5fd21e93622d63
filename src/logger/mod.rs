//! Logger module
//!
//! Server diagnostics:
//! - lifecycle messages (start, shutdown)
//! - access log lines in configurable formats
//! - warnings and errors
//!
//! This is the server's own log. The interpreter writes `sardine.log`,
//! which is never touched from here.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger from the logging settings.
///
/// Call once at startup, before any other log function.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        config.logging.level.eq_ignore_ascii_case("debug"),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_debug(message: &str) {
    if let Some(w) = writer::get() {
        w.write_debug(&format!("[DEBUG] {message}"));
    }
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, data_dir: &Path) {
    write_info("======================================");
    write_info("Sardine web editor started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Data directory: {}", data_dir.display()));
    write_info(&format!("Static files: {}", config.paths.static_dir));
    write_info(&format!("Interpreter: {}", config.interpreter.command.join(" ")));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_browser_open(url: &str) {
    write_info(&format!("Opening embedded editor at: {url}"));
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("[Shutdown] {reason}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
