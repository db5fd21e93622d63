// Application state module
// Everything a request handler needs, built once at startup

use std::path::PathBuf;
use tokio::sync::Mutex;

use super::types::Config;
use crate::console::ConsoleBridge;
use crate::store::{FileStore, LogTail};

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: FileStore,
    /// The one interpreter, shared by every request
    pub console: ConsoleBridge,
    /// Read position in the interpreter log
    pub log_tail: Mutex<LogTail>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: Config, store: FileStore, console: ConsoleBridge) -> Self {
        let log_tail = Mutex::new(LogTail::new(store.layout().log_file()));
        let static_dir = PathBuf::from(&config.paths.static_dir);

        Self {
            config,
            store,
            console,
            log_tail,
            static_dir,
        }
    }
}
