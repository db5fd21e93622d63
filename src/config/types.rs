// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub interpreter: InterpreterConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Open the editor in the default browser once listening
    pub open_browser: bool,
}

/// Where files live
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Buffers, editor config and interpreter log (per-user data dir if unset)
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Built editor client
    pub static_dir: String,
}

/// Interpreter process configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InterpreterConfig {
    /// Python executable and any leading arguments; the console driver is
    /// appended as `-u -c <driver>`
    #[serde(default = "default_interpreter_command")]
    pub command: Vec<String>,
    /// Mirror interpreter output on the terminal
    pub echo_output: bool,
    /// Seconds to wait for the interpreter to finish one request
    pub reply_timeout: u64,
}

pub fn default_interpreter_command() -> Vec<String> {
    ["python3"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
