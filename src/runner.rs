use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::command::render_command_line;
use crate::console::SharedSink;
use crate::types::{ScanResult, ScanRun};

/// A program plus its argument tokens, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run `binary` through an escalation wrapper: the wrapper becomes the
    /// program and `binary` its first argument.
    pub fn escalated(wrapper: impl Into<String>, binary: impl Into<String>, args: Vec<String>) -> Self {
        let mut wrapped = Vec::with_capacity(args.len() + 1);
        wrapped.push(binary.into());
        wrapped.extend(args);
        Self::new(wrapper, wrapped)
    }

    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }
}

/// Per-stream line buffers, observable while a run is in progress.
#[derive(Clone, Debug, Default)]
pub struct SharedOutput {
    pub stdout: Arc<Mutex<Vec<String>>>,
    pub stderr: Arc<Mutex<Vec<String>>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Spawns one external process per call and drains both of its output
/// streams while it runs.
#[derive(Clone)]
pub struct Runner {
    sink: SharedSink,
}

#[derive(Clone, Copy, Debug)]
enum Stream {
    Stdout,
    Stderr,
}

impl Runner {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    /// Execute `invocation` and wait for it to exit.
    ///
    /// Stdout lines are relayed to the sink as they arrive; stderr is only
    /// captured. A process that cannot be started yields a failed result
    /// rather than an error.
    pub async fn run(&self, invocation: &Invocation) -> ScanResult {
        self.run_with_shared(invocation, SharedOutput::new()).await
    }

    pub async fn run_with_shared(&self, invocation: &Invocation, shared: SharedOutput) -> ScanResult {
        let run = ScanRun::begin(invocation.command_line());

        let mut child = match Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %invocation.program, error = %e, "failed to launch scan");
                return run.fail(format!("Failed to execute {}: {e}", invocation.program));
            }
        };
        info!(program = %invocation.program, args = ?invocation.args, "scan process started");

        let mut readers = JoinSet::new();
        if let Some(out) = child.stdout.take() {
            readers.spawn(drain_lines(
                out,
                Stream::Stdout,
                shared.stdout.clone(),
                Some(self.sink.clone()),
            ));
        }
        if let Some(err) = child.stderr.take() {
            readers.spawn(drain_lines(err, Stream::Stderr, shared.stderr.clone(), None));
        }

        let status = child.wait().await;

        // Both pipes reach EOF once the child is gone; collect the tails.
        while let Some(res) = readers.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "output reader task failed");
            }
        }

        let output = join_lines(&shared.stdout).await;
        let error_output = join_lines(&shared.stderr).await;

        match status {
            Ok(status) => {
                let result = run.complete(status.code(), output, error_output);
                info!(
                    exit_code = ?result.exit_code,
                    duration_ms = result.duration().whole_milliseconds() as u64,
                    success = result.success,
                    "scan process exited"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "failed waiting for scan process");
                let mut errors = error_output;
                errors.push_str(&format!("Failed to wait for {}: {e}\n", invocation.program));
                run.complete(None, output, errors)
            }
        }
    }
}

/// Read `reader` line by line into `buffer` until EOF, optionally echoing each
/// line to `relay`. Invalid UTF-8 is replaced rather than ending the stream.
async fn drain_lines<R>(
    reader: R,
    stream: Stream,
    buffer: Arc<Mutex<Vec<String>>>,
    relay: Option<SharedSink>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::with_capacity(256);
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&raw)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if let Some(sink) = &relay {
                    sink.line(&line);
                }
                buffer.lock().await.push(line);
            }
            Err(e) => {
                warn!(stream = ?stream, error = %e, "stopped reading process output");
                break;
            }
        }
    }
}

/// Each captured line terminated by `\n`.
async fn join_lines(buffer: &Arc<Mutex<Vec<String>>>) -> String {
    let guard = buffer.lock().await;
    let mut text = String::with_capacity(guard.iter().map(|l| l.len() + 1).sum());
    for line in guard.iter() {
        text.push_str(line);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalated_invocation_puts_binary_first() {
        let inv = Invocation::escalated("sudo", "nmap", vec!["-sS".into(), "10.0.0.1".into()]);
        assert_eq!(inv.program, "sudo");
        assert_eq!(inv.args, vec!["nmap", "-sS", "10.0.0.1"]);
        assert_eq!(inv.command_line(), "sudo nmap -sS 10.0.0.1");
    }

    #[tokio::test]
    async fn join_lines_terminates_each_line() {
        let buf = Arc::new(Mutex::new(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(join_lines(&buf).await, "a\nb\n");
    }

    #[tokio::test]
    async fn drain_handles_crlf_and_missing_final_newline() {
        let data: &[u8] = b"first\r\nsecond\nlast";
        let buf = Arc::new(Mutex::new(Vec::new()));
        drain_lines(data, Stream::Stdout, buf.clone(), None).await;
        assert_eq!(*buf.lock().await, vec!["first", "second", "last"]);
    }

    #[tokio::test]
    async fn drain_replaces_invalid_utf8() {
        let data: &[u8] = b"ok\n\xff\xfe\nafter\n";
        let buf = Arc::new(Mutex::new(Vec::new()));
        drain_lines(data, Stream::Stderr, buf.clone(), None).await;
        let lines = buf.lock().await.clone();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "after");
    }
}
