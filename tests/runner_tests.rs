#![cfg(unix)]

use std::sync::Arc;

use nmap_wrap_rs::console::{RecordingSink, SharedSink, Tone};
use nmap_wrap_rs::runner::{Invocation, Runner, SharedOutput};

fn sh(script: &str) -> Invocation {
    Invocation::new("sh", vec!["-c".to_string(), script.to_string()])
}

#[tokio::test]
async fn captures_stdout_and_stderr_on_success() {
    let sink = Arc::new(RecordingSink::new());
    let runner = Runner::new(sink.clone());

    let result = runner
        .run(&sh("echo one; echo two; echo oops >&2; echo three; exit 0"))
        .await;

    assert!(result.success);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.output, "one\ntwo\nthree\n");
    assert_eq!(result.error_output, "oops\n");
    assert!(result.finished_at >= result.started_at);
    assert!(result.command.starts_with("sh -c "));

    // stdout is relayed live, stderr is not
    assert_eq!(sink.with_tone(Tone::Plain), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn nonzero_exit_is_failure() {
    let runner = Runner::new(Arc::new(RecordingSink::new()));
    let result = runner.run(&sh("echo partial; exit 3")).await;
    assert!(!result.success);
    assert_eq!(result.exit_code, Some(3));
    assert_eq!(result.output, "partial\n");
}

#[tokio::test]
async fn missing_binary_becomes_failed_result() {
    let runner = Runner::new(Arc::new(RecordingSink::new()));
    let inv = Invocation::new(
        "/nonexistent/path/to/nmap-4f2a",
        vec!["-sS".to_string(), "127.0.0.1".to_string()],
    );

    let result = runner.run(&inv).await;

    assert!(!result.success);
    assert_eq!(result.exit_code, None);
    assert!(!result.error_output.is_empty());
    assert!(result.error_output.contains("/nonexistent/path/to/nmap-4f2a"));
    assert_eq!(result.started_at, result.finished_at);
    assert_eq!(result.command, "/nonexistent/path/to/nmap-4f2a -sS 127.0.0.1");
}

#[tokio::test]
async fn heavy_output_on_both_streams_does_not_stall() {
    let sink: SharedSink = Arc::new(RecordingSink::new());
    let runner = Runner::new(sink);
    let script = "i=0; while [ $i -lt 20000 ]; do echo out $i; echo err $i >&2; i=$((i+1)); done";

    let result = runner.run(&sh(script)).await;

    assert!(result.success);
    assert_eq!(result.output.lines().count(), 20000);
    assert_eq!(result.error_output.lines().count(), 20000);
    assert_eq!(result.output.lines().last(), Some("out 19999"));
    assert_eq!(result.error_output.lines().next(), Some("err 0"));
}

#[tokio::test]
async fn escalation_wrapper_receives_binary_as_first_argument() {
    let runner = Runner::new(Arc::new(RecordingSink::new()));
    let inv = Invocation::escalated(
        "env",
        "sh",
        vec!["-c".to_string(), "echo via-wrapper".to_string()],
    );

    let result = runner.run(&inv).await;

    assert!(result.success);
    assert_eq!(result.output, "via-wrapper\n");
    assert_eq!(result.command, "env sh -c 'echo via-wrapper'");
}

#[tokio::test]
async fn shared_output_is_filled_per_stream() {
    let runner = Runner::new(Arc::new(RecordingSink::new()));
    let shared = SharedOutput::new();

    let result = runner
        .run_with_shared(&sh("echo a; echo b >&2; echo c"), shared.clone())
        .await;

    assert!(result.success);
    assert_eq!(*shared.stdout.lock().await, vec!["a", "c"]);
    assert_eq!(*shared.stderr.lock().await, vec!["b"]);
}
