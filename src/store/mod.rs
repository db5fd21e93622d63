//! File store module
//!
//! Owns everything the server persists under the data directory:
//! - editor buffers (one text file per tab) in `buffers/`
//! - the client-owned editor config in `config.json`
//! - the interpreter log `sardine.log`, read back through [`LogTail`]
//!
//! Buffer names are checked before any write so the store never touches a
//! path outside the buffer directory.

mod log_tail;
pub mod paths;

pub use log_tail::LogTail;
pub use paths::DataLayout;

use crate::logger;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Key wrapping the editor config on disk
const CONFIG_ENVELOPE_KEY: &str = "config";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid buffer name: {0:?}")]
    InvalidName(String),
    #[error("unsupported content for buffer {0:?}: expected a string or a list of strings")]
    InvalidContent(String),
    #[error("config file has no \"config\" key")]
    MissingEnvelope,
}

/// Buffer name -> content, ordered by name
pub type BufferMap = BTreeMap<String, String>;

/// Disk-backed store for buffers and the editor config
#[derive(Debug, Clone)]
pub struct FileStore {
    layout: DataLayout,
}

impl FileStore {
    pub const fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Directory shown by `/open_folder`
    pub fn data_dir(&self) -> &Path {
        self.layout.root()
    }

    /// Create the buffer directory and touch every default buffer.
    ///
    /// Existing buffers keep their content. Returns the names of the
    /// buffers that had to be created.
    pub async fn ensure_buffers_exist(&self) -> io::Result<Vec<String>> {
        let dir = self.layout.buffers_dir();
        fs::create_dir_all(&dir).await?;

        let mut created = Vec::new();
        for name in paths::default_buffer_names() {
            let path = dir.join(&name);
            if fs::try_exists(&path).await? {
                continue;
            }
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            created.push(name);
        }
        Ok(created)
    }

    /// Truncate the interpreter log so a new session starts empty
    pub async fn reset_log(&self) -> io::Result<()> {
        fs::create_dir_all(self.layout.root()).await?;
        fs::File::create(self.layout.log_file()).await?;
        Ok(())
    }

    /// Read every non-hidden file in the buffer directory
    pub async fn list_buffers(&self) -> io::Result<BufferMap> {
        self.collect_buffers(|_| true).await
    }

    /// Read the buffers the editor shows as tabs (`*.py`)
    pub async fn list_text_files(&self) -> io::Result<BufferMap> {
        self.collect_buffers(|name| name.ends_with(".py")).await
    }

    async fn collect_buffers(&self, keep: impl Fn(&str) -> bool) -> io::Result<BufferMap> {
        let mut buffers = BufferMap::new();
        let mut entries = fs::read_dir(self.layout.buffers_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // .DS_Store and editor swap files
            if name.starts_with('.') || !keep(&name) {
                continue;
            }
            match entry.file_type().await {
                Ok(t) if t.is_file() => {}
                _ => continue,
            }

            let content = match fs::read(entry.path()).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    logger::log_error(&format!("Failed to read buffer '{name}': {e}"));
                    String::new()
                }
            };
            buffers.insert(name, content);
        }
        Ok(buffers)
    }

    /// Overwrite buffers from a `name -> content` JSON object.
    ///
    /// Content is a string or a list of lines joined with `\n`. All names and
    /// contents are validated before the first write; after that the first
    /// I/O error aborts the batch and earlier writes are kept.
    pub async fn save_buffers(&self, buffers: &Map<String, Value>) -> Result<usize, StoreError> {
        let mut pending = Vec::with_capacity(buffers.len());
        for (name, content) in buffers {
            let path = self.buffer_path(name)?;
            let text = buffer_text(name, content)?;
            pending.push((path, text));
        }

        for (path, text) in &pending {
            fs::write(path, text).await?;
        }
        Ok(pending.len())
    }

    /// Path of a buffer inside the buffer directory
    pub fn buffer_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_buffer_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.layout.buffers_dir().join(name))
    }

    /// Read the editor config, unwrapping the `{"config": ...}` envelope
    pub async fn read_config(&self) -> Result<Value, StoreError> {
        let raw = fs::read_to_string(self.layout.config_file()).await?;
        let mut document: Value = serde_json::from_str(&raw)?;
        document
            .get_mut(CONFIG_ENVELOPE_KEY)
            .map(Value::take)
            .ok_or(StoreError::MissingEnvelope)
    }

    /// Wrap the editor config in its envelope and overwrite the file
    pub async fn write_config(&self, config: Value) -> Result<(), StoreError> {
        let mut document = Map::new();
        document.insert(CONFIG_ENVELOPE_KEY.to_string(), config);
        let serialized = serde_json::to_string(&Value::Object(document))?;

        fs::create_dir_all(self.layout.root()).await?;
        fs::write(self.layout.config_file(), serialized).await?;
        Ok(())
    }
}

/// A buffer name is a single plain file name
fn is_valid_buffer_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && name != ".."
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

fn buffer_text(name: &str, content: &Value) -> Result<String, StoreError> {
    match content {
        Value::String(s) => Ok(s.clone()),
        Value::Array(lines) => lines
            .iter()
            .map(|line| line.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(|lines| lines.join("\n"))
            .ok_or_else(|| StoreError::InvalidContent(name.to_string())),
        _ => Err(StoreError::InvalidContent(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(DataLayout::new(dir.path()));
        store.ensure_buffers_exist().await.unwrap();
        (dir, store)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_ensure_buffers_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(DataLayout::new(dir.path().join("nested")));

        let created = store.ensure_buffers_exist().await.unwrap();
        assert_eq!(created.len(), 9);

        let buffers = store.list_buffers().await.unwrap();
        assert_eq!(buffers.len(), 9);
        assert!(buffers.values().all(String::is_empty));
    }

    #[tokio::test]
    async fn test_ensure_buffers_is_idempotent() {
        let (_dir, store) = store().await;
        store
            .save_buffers(&object(json!({"buffer1.py": "print('hi')"})))
            .await
            .unwrap();

        let created = store.ensure_buffers_exist().await.unwrap();
        assert!(created.is_empty());

        let buffers = store.list_buffers().await.unwrap();
        assert_eq!(buffers.len(), 9);
        assert_eq!(buffers["buffer1.py"], "print('hi')");
    }

    #[tokio::test]
    async fn test_save_then_list_round_trips() {
        let (_dir, store) = store().await;
        let content = "d1 * bd\n\tsn 'hh'\n# ünïcode\n";
        let written = store
            .save_buffers(&object(json!({"buffer2.py": content, "notes.txt": "x"})))
            .await
            .unwrap();
        assert_eq!(written, 2);

        let buffers = store.list_buffers().await.unwrap();
        assert_eq!(buffers["buffer2.py"], content);
        assert_eq!(buffers["notes.txt"], "x");
    }

    #[tokio::test]
    async fn test_save_joins_line_lists() {
        let (_dir, store) = store().await;
        store
            .save_buffers(&object(json!({"buffer3.py": ["a = 1", "b = 2"]})))
            .await
            .unwrap();

        let buffers = store.list_buffers().await.unwrap();
        assert_eq!(buffers["buffer3.py"], "a = 1\nb = 2");
    }

    #[tokio::test]
    async fn test_save_rejects_traversal() {
        let (dir, store) = store().await;
        for name in ["../escape.py", "..", "sub/dir.py", ".hidden", "", "a\\b.py"] {
            let result = store.save_buffers(&object(json!({ name: "x" }))).await;
            assert!(
                matches!(result, Err(StoreError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(!dir.path().join("escape.py").exists());
    }

    #[tokio::test]
    async fn test_save_validates_before_writing() {
        let (_dir, store) = store().await;
        let result = store
            .save_buffers(&object(json!({"buffer1.py": "kept?", "buffer2.py": 42})))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidContent(_))));

        let buffers = store.list_buffers().await.unwrap();
        assert_eq!(buffers["buffer1.py"], "");
    }

    #[tokio::test]
    async fn test_list_skips_hidden_and_directories() {
        let (dir, store) = store().await;
        let buffers_dir = dir.path().join("buffers");
        std::fs::write(buffers_dir.join(".DS_Store"), "junk").unwrap();
        std::fs::create_dir(buffers_dir.join("folder.py")).unwrap();

        let buffers = store.list_buffers().await.unwrap();
        assert!(!buffers.contains_key(".DS_Store"));
        assert!(!buffers.contains_key("folder.py"));
    }

    #[tokio::test]
    async fn test_list_text_files_only_python() {
        let (_dir, store) = store().await;
        store
            .save_buffers(&object(json!({"readme.md": "# hi"})))
            .await
            .unwrap();

        let files = store.list_text_files().await.unwrap();
        assert_eq!(files.len(), 9);
        assert!(files.keys().all(|k| k.ends_with(".py")));
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let (dir, store) = store().await;
        let config = json!({"theme": "dark", "font_size": 14, "keys": ["vim", null]});
        store.write_config(config.clone()).await.unwrap();

        assert_eq!(store.read_config().await.unwrap(), config);

        let raw = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        let on_disk: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, json!({ "config": config }));
    }

    #[tokio::test]
    async fn test_read_config_errors() {
        let (dir, store) = store().await;
        assert!(matches!(store.read_config().await, Err(StoreError::Io(_))));

        std::fs::write(dir.path().join("config.json"), "{not json").unwrap();
        assert!(matches!(store.read_config().await, Err(StoreError::Json(_))));

        std::fs::write(dir.path().join("config.json"), r#"{"other": 1}"#).unwrap();
        assert!(matches!(
            store.read_config().await,
            Err(StoreError::MissingEnvelope)
        ));
    }

    #[tokio::test]
    async fn test_reset_log_truncates() {
        let (dir, store) = store().await;
        let log = dir.path().join("sardine.log");
        std::fs::write(&log, "old session\n").unwrap();

        store.reset_log().await.unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "");
    }
}
