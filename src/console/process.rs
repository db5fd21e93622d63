//! Interpreter child process
//!
//! Runs Python with a small console driver (`driver.py`) as a child process.
//! Requests go to its stdin as one JSON object per line:
//!
//! - `{"id": 1, "op": "reset"}` empties the interactive input buffer
//! - `{"id": 2, "op": "run", "code": "..."}` compiles and runs source as one unit
//! - `{"id": 3, "op": "line", "code": "..."}` feeds one terminal line
//!
//! Each request is answered on stdout by a line starting with
//! [`REPLY_MARK`], carrying `{"id": .., "error": null | "SyntaxError: .."}`.
//! Everything else the interpreter prints is appended to the session log,
//! which the editor polls through `/log`.

use super::{Console, ConsoleError};
use crate::config::InterpreterConfig;
use crate::logger;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Console driver run with `python -u -c`
const DRIVER: &str = include_str!("driver.py");

/// Prefix of reply lines on the driver's stdout
pub const REPLY_MARK: &str = "\x1esardine-reply\x1e";

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request<'a> {
    Reset { id: u64 },
    Run { id: u64, code: &'a str },
    Line { id: u64, code: &'a str },
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Reply {
    id: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Console backed by a Python process running the console driver
pub struct ProcessConsole {
    stdin: ChildStdin,
    replies: mpsc::UnboundedReceiver<Reply>,
    next_id: u64,
    reply_timeout: Duration,
    exited: Arc<AtomicBool>,
}

/// Owner of the interpreter process lifetime
pub struct InterpreterHandle {
    kill_tx: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<std::io::Result<ExitStatus>>,
    /// Set once the supervisor has been joined
    finished: Option<Option<ExitStatus>>,
}

impl ProcessConsole {
    /// Start the interpreter.
    ///
    /// `config.command[0]` is the Python executable, the rest its leading
    /// arguments. Output lines go to `log_file` and, with `echo_output`, to
    /// the terminal as well.
    pub fn spawn(
        config: &InterpreterConfig,
        log_file: &Path,
    ) -> Result<(Self, InterpreterHandle), ConsoleError> {
        let Some((program, args)) = config.command.split_first() else {
            return Err(ConsoleError::InvalidInput(
                "interpreter command is empty".to_string(),
            ));
        };

        let mut child = Command::new(program)
            .args(args)
            .args(["-u", "-c", DRIVER])
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConsoleError::Spawn {
                command: config.command.join(" "),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ConsoleError::Exited)?;
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let echo = config.echo_output;
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_output(stdout, log_file.to_path_buf(), echo, Some(reply_tx)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_output(stderr, log_file.to_path_buf(), echo, None));
        }

        let exited = Arc::new(AtomicBool::new(false));
        let (kill_tx, kill_rx) = oneshot::channel();
        let exited_flag = Arc::clone(&exited);
        let supervisor = tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        logger::log_warning(&format!("Failed to kill interpreter: {e}"));
                    }
                    child.wait().await
                }
            };
            exited_flag.store(true, Ordering::SeqCst);
            status
        });

        logger::log_info(&format!(
            "[Console] Interpreter started: {}",
            config.command.join(" ")
        ));
        Ok((
            Self {
                stdin,
                replies,
                next_id: 0,
                reply_timeout: Duration::from_secs(config.reply_timeout),
                exited,
            },
            InterpreterHandle {
                kill_tx: Some(kill_tx),
                supervisor,
                finished: None,
            },
        ))
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Send one request and wait for the reply carrying its id.
    ///
    /// Replies to earlier requests whose caller gave up are skipped.
    async fn call(&mut self, request: &Request<'_>, id: u64) -> Result<(), ConsoleError> {
        if self.exited.load(Ordering::SeqCst) {
            return Err(ConsoleError::Exited);
        }
        let mut line = serde_json::to_string(request).map_err(std::io::Error::from)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let timeout = self.reply_timeout;
        let replies = &mut self.replies;
        let reply = async {
            loop {
                match replies.recv().await {
                    Some(reply) if reply.id == id => return Ok(reply),
                    Some(stale) => {
                        logger::log_debug(&format!("[Console] Skipping reply {}", stale.id));
                    }
                    None => return Err(ConsoleError::Exited),
                }
            }
        };
        let reply = tokio::time::timeout(timeout, reply)
            .await
            .map_err(|_| ConsoleError::NoReply(timeout.as_secs()))??;

        match reply.error {
            Some(message) => Err(ConsoleError::Interpreter(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Console for ProcessConsole {
    async fn reset_buffer(&mut self) -> Result<(), ConsoleError> {
        let id = self.next_id();
        self.call(&Request::Reset { id }, id).await
    }

    async fn push(&mut self, source: &str) -> Result<(), ConsoleError> {
        let id = self.next_id();
        self.call(&Request::Run { id, code: source }, id).await
    }

    async fn push_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        let id = self.next_id();
        self.call(&Request::Line { id, code: line }, id).await
    }
}

impl InterpreterHandle {
    /// Wait until the interpreter exits on its own.
    ///
    /// Cancel safe, and may be called again after it has returned.
    pub async fn wait(&mut self) -> Option<ExitStatus> {
        if let Some(status) = self.finished {
            return status;
        }
        let status = match (&mut self.supervisor).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                logger::log_error(&format!("Failed to wait for interpreter: {e}"));
                None
            }
            Err(e) => {
                logger::log_error(&format!("Interpreter supervisor failed: {e}"));
                None
            }
        };
        self.finished = Some(status);
        status
    }

    /// Kill the interpreter and wait for it to go away
    pub async fn shutdown(mut self) -> Option<ExitStatus> {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }
}

/// Split an output line into printed text and an optional reply payload.
///
/// Output printed without a trailing newline ends up in front of the mark.
fn split_reply(line: &str) -> (&str, Option<&str>) {
    match line.split_once(REPLY_MARK) {
        Some((output, reply)) => (output, Some(reply)),
        None => (line, None),
    }
}

async fn pump_output<R>(
    reader: R,
    log_file: PathBuf,
    echo: bool,
    replies: Option<mpsc::UnboundedSender<Reply>>,
) where
    R: AsyncRead + Unpin,
{
    let is_stderr = replies.is_none();
    let mut log = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .await
    {
        Ok(f) => Some(f),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to open log file '{}': {e}",
                log_file.display()
            ));
            None
        }
    };

    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                logger::log_error(&format!("Failed to read interpreter output: {e}"));
                break;
            }
        };

        let (output, reply) = match replies {
            Some(_) => split_reply(&line),
            None => (line.as_str(), None),
        };
        if let (Some(raw), Some(tx)) = (reply, replies.as_ref()) {
            match serde_json::from_str::<Reply>(raw) {
                Ok(reply) => {
                    let _ = tx.send(reply);
                }
                Err(e) => logger::log_warning(&format!("Malformed interpreter reply: {e}")),
            }
            if output.is_empty() {
                continue;
            }
        }

        if echo {
            if is_stderr {
                eprintln!("{output}");
            } else {
                println!("{output}");
            }
        }
        if let Some(f) = log.as_mut() {
            if let Err(e) = f.write_all(format!("{output}\n").as_bytes()).await {
                logger::log_error(&format!("Failed to write log file: {e}"));
                log = None;
            }
        }
    }
    logger::log_debug("[Console] Interpreter output stream closed");
}
