//! Console bridge module
//!
//! The editor never talks to the interpreter directly. Code arrives over
//! HTTP and is forwarded through a [`ConsoleBridge`], which owns the single
//! interpreter front-end and serializes every call into it.

#[cfg(test)]
pub mod mock;
pub mod process;

use async_trait::async_trait;
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use process::{InterpreterHandle, ProcessConsole};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("interpreter I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to start interpreter `{command}`: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("interpreter has exited")]
    Exited,
    #[error("interpreter did not answer within {0} seconds")]
    NoReply(u64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Interpreter(String),
}

/// Interactive interpreter front-end
#[async_trait]
pub trait Console: Send + Sync {
    /// Drop any partially entered multi-line statement
    async fn reset_buffer(&mut self) -> Result<(), ConsoleError>;

    /// Run a complete piece of source as one unit
    async fn push(&mut self, source: &str) -> Result<(), ConsoleError>;

    /// Feed one line the way an interactive prompt does, buffering
    /// incomplete statements until they are finished
    async fn push_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        self.push(line).await
    }
}

/// Result of `/execute`, serialized as `{"code": ...}` or `{"error": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteOutcome {
    Code(String),
    Error(String),
}

/// Shared, serialized access to the one interpreter
#[derive(Clone)]
pub struct ConsoleBridge {
    console: Arc<Mutex<Box<dyn Console>>>,
}

impl ConsoleBridge {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            console: Arc::new(Mutex::new(console)),
        }
    }

    /// Run code submitted by the editor.
    ///
    /// Lines typed at the terminal may have left an incomplete statement in
    /// the interpreter, so its buffer is reset before every push. Errors are
    /// reported in the outcome, never returned.
    pub async fn execute(&self, code: String) -> ExecuteOutcome {
        let mut console = self.console.lock().await;
        let result = match console.reset_buffer().await {
            Ok(()) => console.push(&code).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => ExecuteOutcome::Code(code),
            Err(e) => ExecuteOutcome::Error(e.to_string()),
        }
    }

    /// Forward one line typed at the terminal
    pub async fn push_line(&self, line: &str) -> Result<(), ConsoleError> {
        self.console.lock().await.push_line(line).await
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockConsole;
    use super::*;

    #[tokio::test]
    async fn test_execute_resets_then_pushes() {
        let mock = MockConsole::new();
        let calls = mock.calls();
        let bridge = ConsoleBridge::new(Box::new(mock));

        let outcome = bridge.execute("1+1".to_string()).await;
        assert_eq!(outcome, ExecuteOutcome::Code("1+1".to_string()));
        assert_eq!(*calls.lock().unwrap(), vec!["reset", "push:1+1"]);
    }

    #[tokio::test]
    async fn test_execute_reports_errors() {
        let bridge = ConsoleBridge::new(Box::new(MockConsole::new()));

        let outcome = bridge.execute("1 +".to_string()).await;
        assert!(matches!(outcome, ExecuteOutcome::Error(ref e) if e.contains("invalid syntax")));
    }

    #[tokio::test]
    async fn test_execute_after_error_still_resets() {
        let mock = MockConsole::new();
        let calls = mock.calls();
        let bridge = ConsoleBridge::new(Box::new(mock));

        bridge.execute("def f(:".to_string()).await;
        let outcome = bridge.execute("x = 2".to_string()).await;
        assert_eq!(outcome, ExecuteOutcome::Code("x = 2".to_string()));
        assert_eq!(calls.lock().unwrap()[2], "reset");
    }

    #[tokio::test]
    async fn test_outcome_serialization() {
        let code = serde_json::to_value(ExecuteOutcome::Code("a".into())).unwrap();
        assert_eq!(code, serde_json::json!({"code": "a"}));
        let error = serde_json::to_value(ExecuteOutcome::Error("b".into())).unwrap();
        assert_eq!(error, serde_json::json!({"error": "b"}));
    }

    #[tokio::test]
    async fn test_push_line_skips_reset() {
        let mock = MockConsole::new();
        let calls = mock.calls();
        let bridge = ConsoleBridge::new(Box::new(mock));

        bridge.push_line("for i in range(3):").await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["push:for i in range(3):"]);
    }
}
