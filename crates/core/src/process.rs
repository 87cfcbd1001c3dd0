//! Subprocess execution with concurrent stream capture and a bounded wait.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{SymbolError, SymbolResult};

/// Phrase `dotnet tool run` prints when the requested tool is not in the manifest.
pub const TOOL_MISSING_MARKER: &str =
    "Cannot find a tool in the manifest file that has a command named";

/// Default upper bound on how long the downloader may run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Shared flag a host can flip to abandon a running process.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Seam between the fetch client and whatever actually runs commands.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, returning every stdout line on success.
    fn run(&self, program: &str, args: &[String]) -> SymbolResult<Vec<String>>;
}

/// Runs real processes, capturing stdout and stderr on two reader threads.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub timeout: Duration,
    pub cancellation: Option<CancellationToken>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, cancellation: None }
    }
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, cancellation: None }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Render `program args...` the way it is reported in error messages.
pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

type LineBuffer = Arc<Mutex<Vec<String>>>;

/// Drain `stream` into `buffer` on its own thread, signalling `done` at end of stream.
fn spawn_reader<R: Read + Send + 'static>(stream: R, buffer: LineBuffer, done: Sender<()>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if let Ok(mut lines) = buffer.lock() {
                        lines.push(line);
                    }
                }
            }
        }
        let _ = done.send(());
    });
}

fn snapshot(buffer: &LineBuffer) -> Vec<String> {
    buffer.lock().map(|lines| lines.clone()).unwrap_or_default()
}

/// Kill the child and return whatever both streams produced so far.
fn abandon(child: &mut Child, output: &LineBuffer, errors: &LineBuffer) -> (String, String) {
    let _ = child.kill();
    let _ = child.wait();
    (snapshot(output).join("\n"), snapshot(errors).join("\n"))
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

impl ProcessRunner {
    fn wait(
        &self,
        child: &mut Child,
        command_line: &str,
        deadline: Instant,
    ) -> SymbolResult<WaitOutcome> {
        loop {
            let status = child.try_wait().map_err(|source| SymbolError::Spawn {
                command_line: command_line.to_string(),
                source,
            })?;
            if let Some(status) = status {
                return Ok(WaitOutcome::Exited(status));
            }
            if self.is_cancelled() {
                return Ok(WaitOutcome::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> SymbolResult<Vec<String>> {
        let command_line = command_line(program, args);
        tracing::debug!(%command_line, timeout_ms = self.timeout.as_millis() as u64, "spawning");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SymbolError::Spawn { command_line: command_line.clone(), source })?;

        let deadline = Instant::now() + self.timeout;
        let output: LineBuffer = Arc::default();
        let errors: LineBuffer = Arc::default();
        let (done_tx, done_rx) = mpsc::channel();
        let mut readers = 0;
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Arc::clone(&output), done_tx.clone());
            readers += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Arc::clone(&errors), done_tx.clone());
            readers += 1;
        }
        drop(done_tx);

        let outcome = self.wait(&mut child, &command_line, deadline)?;

        let status = match outcome {
            WaitOutcome::Exited(status) => status,
            // Readers stay detached: a grandchild may still hold the pipes open.
            WaitOutcome::TimedOut => {
                let (output, error) = abandon(&mut child, &output, &errors);
                tracing::warn!(%command_line, "process timed out");
                return Err(SymbolError::ProcessTimeout { command_line, output, error });
            }
            WaitOutcome::Cancelled => {
                let (output, error) = abandon(&mut child, &output, &errors);
                tracing::warn!(%command_line, "process cancelled");
                return Err(SymbolError::Cancelled { command_line, output, error });
            }
        };

        // The process has exited, but a background grandchild may still hold the pipes;
        // draining shares the same deadline.
        for _ in 0..readers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match done_rx.recv_timeout(remaining) {
                Ok(()) => {}
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(%command_line, "output streams still open at deadline");
                    return Err(SymbolError::ProcessTimeout {
                        command_line,
                        output: snapshot(&output).join("\n"),
                        error: snapshot(&errors).join("\n"),
                    });
                }
            }
        }
        let output = snapshot(&output);
        let errors = snapshot(&errors);

        if status.success() {
            return Ok(output);
        }

        let error = errors.join("\n");
        if error.contains(TOOL_MISSING_MARKER) {
            return Err(SymbolError::ToolMissing { command_line });
        }

        Err(SymbolError::ProcessExecution {
            command_line,
            status: status.to_string(),
            output: output.join("\n"),
            error,
        })
    }
}
