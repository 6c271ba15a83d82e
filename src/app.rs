use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::CommandFactory;

use crate::cli::{apply_scan_args, Cli};
use crate::command::build_args;
use crate::console::{SharedSink, Tone};
use crate::report::{write_record_json, Reporter};
use crate::runner::{Invocation, Runner};
use crate::targets::load_targets_file;
use crate::toolcheck::{self, INSTALL_HINT};
use crate::types::ScanConfiguration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// One complete command-line session: configure, scan, report.
///
/// Returns the process exit code. Configuration errors are printed as
/// `Error: ...` and give `EXIT_FAILURE`; anything returned as `Err` is fatal
/// and left to the caller to report.
pub async fn run(cli: Cli, sink: SharedSink) -> Result<u8> {
    sink.emit(
        Tone::Heading,
        &format!("nmap-wrap-rs v{}", env!("CARGO_PKG_VERSION")),
    );
    sink.emit(Tone::Heading, &"=".repeat(80));
    sink.line("");

    let mut config = match cli.profile.as_deref() {
        Some(path) => load_profile(path)?,
        None => ScanConfiguration::default(),
    };

    let parsed = apply_scan_args(&cli.scan_args, &mut config);
    for warning in &parsed.warnings {
        sink.warn(warning);
    }
    if parsed.show_help {
        Cli::command().print_help()?;
        return Ok(EXIT_SUCCESS);
    }

    for path in &parsed.imports {
        let import = load_targets_file(path)?;
        for (line_no, text) in &import.rejected {
            sink.warn(&format!(
                "Warning: Invalid target '{text}' in {} line {line_no}, skipping...",
                path.display()
            ));
        }
        sink.line(&format!(
            "Imported {} targets from {}",
            import.targets.len(),
            path.display()
        ));
        for target in &import.targets {
            config.targets.add_target(target);
        }
    }

    let version = toolcheck::binary_version(&cli.nmap)
        .await
        .ok_or_else(|| anyhow!("{} is not installed or not in PATH.\n{INSTALL_HINT}", cli.nmap))?;
    sink.line(&format!("Using {version}"));
    sink.line("");

    let args = match build_args(&config) {
        Ok(args) => args,
        Err(e) => {
            sink.error(&format!("Error: {e}"));
            return Ok(EXIT_FAILURE);
        }
    };

    let privileged = toolcheck::is_privileged().await;
    let escalate = toolcheck::needs_escalation(config.mode, privileged, parsed.force_escalation);
    let invocation = if escalate {
        if !parsed.force_escalation {
            sink.line(&format!(
                "Note: {} requires root privileges, using {}...",
                config.mode.description(),
                cli.escalate_with
            ));
            sink.line("");
        }
        Invocation::escalated(cli.escalate_with.as_str(), cli.nmap.as_str(), args)
    } else {
        Invocation::new(cli.nmap.as_str(), args)
    };

    let result = Runner::new(sink.clone()).run(&invocation).await;

    let reporter = Reporter::new(sink.clone());
    reporter.display(&result);

    if let Some((path, format)) = config.output_target() {
        reporter.persist(&result, path, format)?;
    }

    if let Some(path) = cli.record.as_deref() {
        write_record_json(path, &result)
            .with_context(|| format!("failed to write scan record to {}", path.display()))?;
        sink.line(&format!("Wrote JSON record to {}", path.display()));
    }

    Ok(if result.success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

fn load_profile(path: &Path) -> Result<ScanConfiguration> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read profile: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid profile JSON: {}", path.display()))
}
