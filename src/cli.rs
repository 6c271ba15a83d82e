use std::path::PathBuf;

use clap::Parser;

use crate::ports::parse_port_arg;
use crate::types::{OutputFormat, PortSelection, ScanConfiguration, ScanMode, TimingTemplate};

/// nmap-wrap-rs: build an nmap command line from scan options, run it and report the result.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nmap-wrap-rs",
    version,
    about = "Build an nmap command line from scan options, run it with live output and save the results.",
    long_about = None,
    after_help = SCAN_HELP
)]
pub struct Cli {
    /// nmap binary to execute.
    #[arg(long, env = "NMAP_WRAP_BINARY", default_value = "nmap")]
    pub nmap: String,

    /// Privilege-escalation wrapper used for SYN/UDP scans when not root.
    #[arg(long = "escalate-with", env = "NMAP_WRAP_ESCALATE", default_value = "sudo")]
    pub escalate_with: String,

    /// JSON file holding a saved scan configuration; scan arguments are applied on top.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Write the finished scan result as pretty JSON to this path.
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG).
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    /// nmap-style scan arguments and targets (see below). Must follow the options above.
    #[arg(
        value_name = "SCAN ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub scan_args: Vec<String>,
}

pub const SCAN_HELP: &str = "\
SCAN TYPES:
  -sS                TCP SYN scan (stealth, requires root)
  -sT                TCP connect scan
  -sA                TCP ACK scan
  -sF                TCP FIN scan
  -sN                TCP NULL scan
  -sX                TCP Xmas scan
  -sW                TCP Window scan
  -sU                UDP scan (requires root)

TARGET SPECIFICATION:
  <target>           IP address, hostname, CIDR block or range (192.168.1.1-50)
  -iL <file>         Let nmap read targets from a file
  --import <file>    Read targets from a file here (skips blanks, # comments, bad lines)
  --exclude <list>   Exclude targets (comma-separated)

PORT SPECIFICATION:
  -p <ports>         Specific ports (80,443,8080) or range (1-1000)
  -p-                All 65535 ports
  -F                 Fast mode (top 100 ports)
  --top-ports <N>    Scan top N ports

TIMING:
  -T0 .. -T5         Paranoid, Sneaky, Polite, Normal (default), Aggressive, Insane

OUTPUT:
  -oN <file>         Save a text report
  -oJ <file>         Save JSON output
  -oX <file>         Save XML output

TUNING:
  --max-retries <N>       Cap port scan probe retransmissions
  --host-timeout <secs>   Give up on a host after this many seconds
  --min-parallelism <N>   Minimum number of parallel probes

OTHER:
  -v                 Verbose nmap output
  --sudo             Always run through the escalation wrapper
  -h, --help         Show this help

EXAMPLES:
  nmap-wrap-rs -sS 192.168.1.1
  nmap-wrap-rs -sT -p 80,443 scanme.nmap.org
  nmap-wrap-rs -sS -T4 192.168.1.0/24 -oX results.xml
  nmap-wrap-rs -F -iL targets.txt --exclude 192.168.1.1";

/// Side effects requested by scan arguments beyond the configuration itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanArgs {
    pub force_escalation: bool,
    pub show_help: bool,
    /// Files to read with `targets::load_targets_file`.
    pub imports: Vec<PathBuf>,
    /// Human-readable warnings about ignored arguments.
    pub warnings: Vec<String>,
}

/// Apply nmap-style scan arguments to `config`.
///
/// Later arguments override earlier ones; setting any port selector replaces
/// the previous selector. Unknown flags and flags missing a usable value are
/// reported in `warnings` and otherwise ignored. Parsing stops at `-h`.
pub fn apply_scan_args<S: AsRef<str>>(args: &[S], config: &mut ScanConfiguration) -> ScanArgs {
    let mut out = ScanArgs::default();
    let mut iter = args.iter().map(|a| a.as_ref());

    while let Some(arg) = iter.next() {
        if let Some(mode) = ScanMode::from_flag(arg) {
            config.mode = mode;
            continue;
        }
        if let Some(timing) = timing_flag(arg) {
            config.timing = timing;
            continue;
        }

        match arg {
            "-p" => match iter.next() {
                Some(v) => config.ports = parse_port_arg(v),
                None => out.missing_value(arg),
            },
            "-p-" => config.ports = PortSelection::All,
            "-F" => config.ports = PortSelection::Fast,
            "--top-ports" => {
                if let Some(n) = out.number::<u32>(arg, iter.next()) {
                    config.ports = PortSelection::Top(n);
                }
            }
            "-oN" | "-oJ" | "-oX" => match iter.next() {
                Some(path) => {
                    config.output_format = match arg {
                        "-oN" => OutputFormat::Text,
                        "-oJ" => OutputFormat::Json,
                        _ => OutputFormat::Xml,
                    };
                    config.output_file = Some(PathBuf::from(path));
                }
                None => out.missing_value(arg),
            },
            "-iL" => match iter.next() {
                Some(path) => config.targets.input_file = Some(PathBuf::from(path)),
                None => out.missing_value(arg),
            },
            "--import" => match iter.next() {
                Some(path) => out.imports.push(PathBuf::from(path)),
                None => out.missing_value(arg),
            },
            "--exclude" => match iter.next() {
                Some(list) => list.split(',').for_each(|e| config.targets.add_exclusion(e)),
                None => out.missing_value(arg),
            },
            "--max-retries" => {
                if let Some(n) = out.number::<u32>(arg, iter.next()) {
                    config.max_retries = Some(n);
                }
            }
            "--host-timeout" => {
                let value = iter.next().map(|v| v.trim_end_matches('s'));
                if let Some(n) = out.number::<u64>(arg, value) {
                    config.host_timeout_secs = Some(n);
                }
            }
            "--min-parallelism" => {
                if let Some(n) = out.number::<u32>(arg, iter.next()) {
                    config.max_parallelism = Some(n);
                }
            }
            "-v" => config.verbose = true,
            "--sudo" => out.force_escalation = true,
            flag if WRAPPER_OPTIONS.contains(&flag) => {
                let _ = iter.next();
                out.warnings.push(format!(
                    "Warning: Option '{flag}' must come before scan arguments, ignoring..."
                ));
            }
            "-h" | "--help" => {
                out.show_help = true;
                break;
            }
            target if !target.starts_with('-') => config.targets.add_target(target),
            unknown => out
                .warnings
                .push(format!("Warning: Unknown option '{unknown}', ignoring...")),
        }
    }

    out
}

/// Wrapper options that take a value. After the first scan argument they are
/// no longer seen by clap, so their value must not leak into the targets.
const WRAPPER_OPTIONS: [&str; 5] = ["--nmap", "--escalate-with", "--profile", "--record", "--log-level"];

fn timing_flag(arg: &str) -> Option<TimingTemplate> {
    let level = arg.strip_prefix("-T")?;
    if level.len() != 1 {
        return None;
    }
    TimingTemplate::from_level(level.parse().ok()?)
}

impl ScanArgs {
    fn missing_value(&mut self, flag: &str) {
        self.warnings
            .push(format!("Warning: Option '{flag}' requires a value, ignoring..."));
    }

    fn number<T: std::str::FromStr>(&mut self, flag: &str, value: Option<&str>) -> Option<T> {
        let Some(raw) = value else {
            self.missing_value(flag);
            return None;
        };
        match raw.trim().parse::<T>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.warnings.push(format!(
                    "Warning: Invalid number '{raw}' for option '{flag}', ignoring..."
                ));
                None
            }
        }
    }
}
