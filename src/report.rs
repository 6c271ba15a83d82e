use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ::time::{format_description::well_known, OffsetDateTime};
use serde::Serialize;
use tracing::info;

use crate::console::{SharedSink, Tone};
use crate::error::ReportError;
use crate::types::{OutputFormat, ScanResult};

const RULE_WIDTH: usize = 80;

/// Where a persisted report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    /// Plain-text report written by us.
    Text(PathBuf),
    /// nmap wrote the file itself during the scan.
    Delegated(PathBuf),
    /// The file nmap should have written is missing; a plain-text report was
    /// written here instead.
    Fallback(PathBuf),
}

/// Renders finished scans to the console and to disk.
#[derive(Clone)]
pub struct Reporter {
    sink: SharedSink,
}

impl Reporter {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    pub fn display(&self, result: &ScanResult) {
        let rule = "=".repeat(RULE_WIDTH);
        let thin = "-".repeat(RULE_WIDTH);
        let sink = &self.sink;

        sink.line("");
        sink.emit(Tone::Heading, &rule);
        sink.emit(Tone::Heading, "SCAN RESULTS");
        sink.emit(Tone::Heading, &rule);
        sink.line("");

        for line in summary_lines(result) {
            sink.line(&line);
        }
        let (tone, status) = if result.success {
            (Tone::Success, "SUCCESS")
        } else {
            (Tone::Error, "FAILED")
        };
        sink.emit(tone, &format!("Status: {status}"));
        sink.line("");

        if !result.output.trim().is_empty() {
            sink.line("Output:");
            sink.line(&thin);
            sink.line(result.output.trim_end());
        }

        if !result.error_output.trim().is_empty() {
            sink.line("");
            sink.line("Errors:");
            sink.line(&thin);
            sink.error(result.error_output.trim_end());
        }

        sink.line("");
        sink.emit(Tone::Heading, &rule);
    }

    /// Persist `result` in `format` at `path`.
    ///
    /// Text reports are written here. JSON and XML files are produced by nmap
    /// itself (its output flag was on the command line); if that file is
    /// missing, a warning is shown and a plain-text report is written next to
    /// it with a `.txt` extension.
    pub fn persist(
        &self,
        result: &ScanResult,
        path: &Path,
        format: OutputFormat,
    ) -> Result<Persisted, ReportError> {
        match format {
            OutputFormat::Text => {
                write_text_report(result, path)?;
                self.sink.line(&format!("Results saved to: {}", path.display()));
                Ok(Persisted::Text(path.to_path_buf()))
            }
            OutputFormat::Json | OutputFormat::Xml => {
                if path.is_file() {
                    self.sink
                        .line(&format!("{format} output saved by nmap to: {}", path.display()));
                    return Ok(Persisted::Delegated(path.to_path_buf()));
                }

                let fallback = path.with_extension("txt");
                info!(path = %path.display(), %format, "expected nmap output file is missing, writing text fallback");
                self.sink.warn(&format!(
                    "Warning: {format} output {} was not produced by nmap; saving a text report to {} instead",
                    path.display(),
                    fallback.display()
                ));
                write_text_report(result, &fallback)?;
                self.sink
                    .line(&format!("Results saved to: {}", fallback.display()));
                Ok(Persisted::Fallback(fallback))
            }
            OutputFormat::Console => Err(ReportError::UnsupportedFormat(format)),
        }
    }
}

fn summary_lines(result: &ScanResult) -> Vec<String> {
    vec![
        format!("Command: {}", result.command),
        format!("Duration: {:.2} seconds", duration_secs(result)),
        format!("Exit Code: {}", exit_code_label(result)),
    ]
}

fn duration_secs(result: &ScanResult) -> f64 {
    result.duration().as_seconds_f64()
}

fn exit_code_label(result: &ScanResult) -> String {
    result
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Self-contained plain-text report mirroring the console summary.
pub fn render_text_report(result: &ScanResult) -> String {
    let status = if result.success { "SUCCESS" } else { "FAILED" };
    format!(
        "Nmap Scan Results\n\
         ==================\n\
         Command: {command}\n\
         Start Time: {start}\n\
         End Time: {end}\n\
         Duration: {duration:.2} seconds\n\
         Exit Code: {code}\n\
         Status: {status}\n\
         \n\
         Output:\n\
         {output}\n\
         \n\
         Errors:\n\
         {errors}\n",
        command = result.command,
        start = rfc3339(result.started_at),
        end = rfc3339(result.finished_at),
        duration = duration_secs(result),
        code = exit_code_label(result),
        output = result.output.trim_end(),
        errors = result.error_output.trim_end(),
    )
}

fn write_text_report(result: &ScanResult, path: &Path) -> Result<(), ReportError> {
    fs::write(path, render_text_report(result)).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON form of a finished scan, written by `--record`.
#[derive(Serialize, Debug)]
pub struct ResultRecord<'a> {
    pub command: &'a str,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
    pub output: &'a str,
    pub error_output: &'a str,
}

impl<'a> From<&'a ScanResult> for ResultRecord<'a> {
    fn from(r: &'a ScanResult) -> Self {
        Self {
            command: &r.command,
            success: r.success,
            exit_code: r.exit_code,
            started_at: rfc3339(r.started_at),
            finished_at: rfc3339(r.finished_at),
            duration_secs: duration_secs(r),
            output: &r.output,
            error_output: &r.error_output,
        }
    }
}

pub fn write_record_json(path: &Path, result: &ScanResult) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &ResultRecord::from(result))?;
    Ok(())
}
