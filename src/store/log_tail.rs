//! Incremental reader for the interpreter log.
//!
//! Remembers how far the file has been read so each call only returns lines
//! appended since the previous one. Only complete lines are consumed; a
//! trailing partial line stays in the file until its newline arrives.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the first unread line
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Return the complete lines appended since the last call, without
    /// line terminators. A missing file has no unread lines.
    pub async fn read_unread(&mut self) -> io::Result<Vec<String>> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        // Truncated or replaced since the last read
        if len < self.offset {
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buf[..last_newline];
        self.offset += last_newline as u64 + 1;

        Ok(complete
            .split(|&b| b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_has_no_lines() {
        let dir = TempDir::new().unwrap();
        let mut tail = LogTail::new(dir.path().join("sardine.log"));
        assert!(tail.read_unread().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lines_are_read_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sardine.log");
        append(&path, "first\nsecond\r\n");

        let mut tail = LogTail::new(&path);
        assert_eq!(tail.read_unread().await.unwrap(), vec!["first", "second"]);
        assert!(tail.read_unread().await.unwrap().is_empty());

        append(&path, "third\n");
        assert_eq!(tail.read_unread().await.unwrap(), vec!["third"]);
    }

    #[tokio::test]
    async fn test_partial_line_waits_for_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sardine.log");
        append(&path, "done\npart");

        let mut tail = LogTail::new(&path);
        assert_eq!(tail.read_unread().await.unwrap(), vec!["done"]);
        assert!(tail.read_unread().await.unwrap().is_empty());

        append(&path, "ial\n");
        assert_eq!(tail.read_unread().await.unwrap(), vec!["partial"]);
    }

    #[tokio::test]
    async fn test_empty_lines_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sardine.log");
        append(&path, "a\n\nb\n");

        let mut tail = LogTail::new(&path);
        assert_eq!(tail.read_unread().await.unwrap(), vec!["a", "", "b"]);
    }

    #[tokio::test]
    async fn test_truncation_restarts_from_beginning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sardine.log");
        append(&path, "a long line from the old session\n");

        let mut tail = LogTail::new(&path);
        tail.read_unread().await.unwrap();
        assert!(tail.offset() > 0);

        std::fs::write(&path, "new\n").unwrap();
        assert_eq!(tail.read_unread().await.unwrap(), vec!["new"]);
    }
}
