// Terminal REPL module
// Forwards lines typed at the terminal to the shared interpreter

use crate::console::ConsoleBridge;
use crate::logger;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Forward `input` line by line until end of input.
///
/// Returns the number of lines forwarded. Interpreter errors are logged and
/// do not stop the loop; a read error does.
pub async fn forward_lines<R>(input: R, console: &ConsoleBridge) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut forwarded = 0;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Err(e) = console.push_line(&line).await {
                    logger::log_warning(&format!("Terminal input not executed: {e}"));
                    continue;
                }
                forwarded += 1;
            }
            Ok(None) => break,
            Err(e) => {
                logger::log_error(&format!("Failed to read terminal input: {e}"));
                break;
            }
        }
    }

    forwarded
}

/// Forward the process stdin until it is closed
pub async fn run(console: ConsoleBridge) -> usize {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    forward_lines(stdin, &console).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::mock::MockConsole;

    #[tokio::test]
    async fn test_forwards_every_line() {
        let mock = MockConsole::new();
        let calls = mock.calls();
        let bridge = ConsoleBridge::new(Box::new(mock));

        let input: &[u8] = b"x = 1\nprint(x)\n";
        let forwarded = forward_lines(input, &bridge).await;

        assert_eq!(forwarded, 2);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["push:x = 1".to_string(), "push:print(x)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_keeps_going_after_interpreter_error() {
        let mock = MockConsole::new();
        let calls = mock.calls();
        let bridge = ConsoleBridge::new(Box::new(mock));

        let input: &[u8] = b"1 +\n2\n";
        let forwarded = forward_lines(input, &bridge).await;

        assert_eq!(forwarded, 1);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let bridge = ConsoleBridge::new(Box::new(MockConsole::new()));
        let input: &[u8] = b"";
        assert_eq!(forward_lines(input, &bridge).await, 0);
    }
}
