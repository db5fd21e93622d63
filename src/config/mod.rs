// Configuration module entry point
// Loads server settings and holds the shared runtime state

mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::store::paths;

pub use state::AppState;
pub use types::{
    default_interpreter_command, Config, HttpConfig, InterpreterConfig, LoggingConfig,
    PathsConfig, PerformanceConfig, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "sardine-web";

/// Environment variable prefix, e.g. `SARDINE_WEB__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SARDINE_WEB";

/// Settings given on the command line, applied over every other source
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_browser: bool,
}

impl Config {
    /// Load configuration: defaults, then the optional file at `config_path`
    /// (without extension), then environment, then command line.
    pub fn load_from(
        config_path: &str,
        overrides: &CliOverrides,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "localhost")?
            .set_default("server.port", 8000)?
            .set_default("server.open_browser", true)?
            .set_default("paths.static_dir", "client/dist")?
            .set_default("interpreter.echo_output", true)?
            .set_default("interpreter.reply_timeout", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "sardine-web")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 10_485_760)?; // 10MB

        if let Some(host) = &overrides.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = overrides.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if overrides.no_browser {
            builder = builder.set_override("server.open_browser", false)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Resolve `host:port`; hostnames such as `localhost` are looked up
    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .map_err(|e| format!("Invalid address {}:{}: {e}", self.server.host, self.server.port))?
            .next()
            .ok_or_else(|| format!("No address found for {}", self.server.host))
    }

    /// URL the browser is pointed at
    pub fn editor_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    /// Configured data directory, or the per-user default
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.paths
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(paths::default_data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(overrides: &CliOverrides) -> Config {
        Config::load_from("/nonexistent/sardine-web-test", overrides).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&CliOverrides::default());
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.server.open_browser);
        assert!(cfg.http.enable_cors);
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.interpreter.command, default_interpreter_command());
        assert_eq!(cfg.interpreter.reply_timeout, 30);
        assert_eq!(cfg.paths.static_dir, "client/dist");
    }

    #[test]
    fn test_cli_overrides_win() {
        let cfg = load(&CliOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9123),
            no_browser: true,
        });
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9123);
        assert!(!cfg.server.open_browser);
        assert_eq!(cfg.editor_url(), "http://127.0.0.1:9123");
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:9123".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("settings");
        std::fs::write(
            base.with_extension("toml"),
            "[paths]\ndata_dir = \"/tmp/sardine-data\"\n\n[interpreter]\ncommand = [\"sardine\"]\n",
        )
        .unwrap();

        let cfg = Config::load_from(base.to_str().unwrap(), &CliOverrides::default()).unwrap();
        assert_eq!(cfg.data_dir(), Some(PathBuf::from("/tmp/sardine-data")));
        assert_eq!(cfg.interpreter.command, vec!["sardine".to_string()]);
    }
}
