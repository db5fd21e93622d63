//! Recording console for tests.

use super::{Console, ConsoleError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every call and rejects obviously broken source
/// (unbalanced brackets or a dangling operator) as invalid syntax.
pub struct MockConsole {
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared call log: `"reset"` and `"push:<source>"` entries
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

fn looks_invalid(source: &str) -> bool {
    let mut depth = 0i32;
    for c in source.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return true;
        }
    }
    depth != 0 || source.trim_end().ends_with(['+', '-', '*', '/', '%', '=', ','])
}

#[async_trait]
impl Console for MockConsole {
    async fn reset_buffer(&mut self) -> Result<(), ConsoleError> {
        self.calls.lock().unwrap().push("reset".to_string());
        Ok(())
    }

    async fn push(&mut self, source: &str) -> Result<(), ConsoleError> {
        self.calls.lock().unwrap().push(format!("push:{source}"));
        if looks_invalid(source) {
            return Err(ConsoleError::Interpreter("invalid syntax".to_string()));
        }
        Ok(())
    }
}
