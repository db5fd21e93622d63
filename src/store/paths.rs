//! On-disk layout of the per-user data directory.

use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "Sardine";
pub const APP_AUTHOR: &str = "Bubobubobubo";

pub const LOG_FILE_NAME: &str = "sardine.log";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const BUFFERS_DIR_NAME: &str = "buffers";

/// Number of buffer files created on first start (`buffer1.py` .. `buffer9.py`)
pub const DEFAULT_BUFFER_COUNT: usize = 9;

/// Names of the default buffer files, one per editor tab
pub fn default_buffer_names() -> Vec<String> {
    (1..=DEFAULT_BUFFER_COUNT)
        .map(|i| format!("buffer{i}.py"))
        .collect()
}

/// Platform data directory for the application.
///
/// Windows nests under the author like `appdirs` does; elsewhere the
/// application name sits directly under the data directory.
pub fn default_data_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::data_local_dir().map(|d| d.join(APP_AUTHOR).join(APP_NAME))
    } else {
        dirs::data_dir().map(|d| d.join(APP_NAME))
    }
}

/// Resolved file locations inside one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn buffers_dir(&self) -> PathBuf {
        self.root.join(BUFFERS_DIR_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_names() {
        let names = default_buffer_names();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "buffer1.py");
        assert_eq!(names[8], "buffer9.py");
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/data/Sardine");
        assert_eq!(layout.buffers_dir(), PathBuf::from("/data/Sardine/buffers"));
        assert_eq!(layout.log_file(), PathBuf::from("/data/Sardine/sardine.log"));
        assert_eq!(layout.config_file(), PathBuf::from("/data/Sardine/config.json"));
    }

    #[test]
    fn test_default_data_dir_ends_with_app_name() {
        if let Some(dir) = default_data_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
