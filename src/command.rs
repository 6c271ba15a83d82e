use tracing::debug;

use crate::error::ConfigError;
use crate::ports::join_ports;
use crate::types::{PortSelection, ScanConfiguration};

/// Translate a configuration into nmap arguments.
///
/// Validation runs first; on success the tokens come out in a fixed order:
/// scan mode, port selection, timing, targets (`-iL` file wins over literal
/// hosts), exclusions, output file, tuning flags, verbose. Every value is its
/// own token so nothing needs shell quoting.
pub fn build_args(config: &ScanConfiguration) -> Result<Vec<String>, ConfigError> {
    let validated = config.validate()?;
    let mut args: Vec<String> = Vec::new();

    args.push(config.mode.flag().to_string());

    push_ports(&mut args, &validated.ports);

    args.push(config.timing.flag());

    let targets = &config.targets;
    if let Some(file) = targets.input_file() {
        args.push("-iL".into());
        args.push(file.to_string_lossy().into_owned());
    } else {
        args.extend(targets.hosts.iter().cloned());
    }

    if !targets.exclusions.is_empty() {
        args.push("--exclude".into());
        args.push(targets.exclusions.join(","));
    }

    if let Some((path, format)) = config.output_target() {
        if let Some(flag) = format.flag() {
            args.push(flag.into());
            args.push(path.to_string_lossy().into_owned());
        }
    }

    if let Some(retries) = config.max_retries {
        args.push("--max-retries".into());
        args.push(retries.to_string());
    }
    if let Some(secs) = config.host_timeout_secs {
        args.push("--host-timeout".into());
        args.push(format!("{secs}s"));
    }
    if let Some(parallel) = config.max_parallelism {
        args.push("--min-parallelism".into());
        args.push(parallel.to_string());
    }

    if config.verbose {
        args.push("-v".into());
    }

    debug!(args = ?args, "translated scan configuration");
    Ok(args)
}

/// At most one selector is emitted: all > fast > top-N > explicit > range.
fn push_ports(args: &mut Vec<String>, ports: &PortSelection) {
    match ports {
        PortSelection::All => args.push("-p-".into()),
        PortSelection::Fast => args.push("-F".into()),
        PortSelection::Top(n) => {
            args.push("--top-ports".into());
            args.push(n.to_string());
        }
        PortSelection::Explicit(list) if !list.is_empty() => {
            args.push("-p".into());
            args.push(join_ports(list));
        }
        PortSelection::Range(spec) if !spec.trim().is_empty() => {
            args.push("-p".into());
            args.push(spec.trim().to_string());
        }
        _ => {}
    }
}

/// Human-readable command line for display and logs. Tokens containing
/// whitespace or quotes are single-quoted.
pub fn render_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(|a| a.as_ref()))
        .map(quote_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_token(token: &str) -> String {
    if !token.is_empty() && !token.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', r"'\''"))
}
