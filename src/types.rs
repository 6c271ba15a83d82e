use std::fmt;
use std::path::PathBuf;

use ::time::OffsetDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Port range used when no port selector was given.
pub const DEFAULT_PORT_RANGE: &str = "1-1000";

/// Probe technique handed to nmap. Each variant maps to exactly one `-s?` flag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Syn,
    Connect,
    Ack,
    Fin,
    Null,
    Xmas,
    Window,
    Udp,
}

impl ScanMode {
    pub const ALL: [ScanMode; 8] = [
        ScanMode::Syn,
        ScanMode::Connect,
        ScanMode::Ack,
        ScanMode::Fin,
        ScanMode::Null,
        ScanMode::Xmas,
        ScanMode::Window,
        ScanMode::Udp,
    ];

    pub fn flag(self) -> &'static str {
        match self {
            ScanMode::Syn => "-sS",
            ScanMode::Connect => "-sT",
            ScanMode::Ack => "-sA",
            ScanMode::Fin => "-sF",
            ScanMode::Null => "-sN",
            ScanMode::Xmas => "-sX",
            ScanMode::Window => "-sW",
            ScanMode::Udp => "-sU",
        }
    }

    /// Raw-socket techniques that nmap refuses to run unprivileged.
    pub fn requires_privilege(self) -> bool {
        matches!(self, ScanMode::Syn | ScanMode::Udp)
    }

    pub fn description(self) -> &'static str {
        match self {
            ScanMode::Syn => "TCP SYN scan (stealth/half-open), requires root",
            ScanMode::Connect => "TCP connect scan (full connection)",
            ScanMode::Ack => "TCP ACK scan (firewall rule mapping)",
            ScanMode::Fin => "TCP FIN scan",
            ScanMode::Null => "TCP NULL scan",
            ScanMode::Xmas => "TCP Xmas scan",
            ScanMode::Window => "TCP Window scan",
            ScanMode::Udp => "UDP scan, requires root",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.flag() == flag)
    }
}

/// nmap `-T<n>` pacing preset, ordered from slowest to fastest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingTemplate {
    Paranoid = 0,
    Sneaky = 1,
    Polite = 2,
    #[default]
    Normal = 3,
    Aggressive = 4,
    Insane = 5,
}

impl TimingTemplate {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(TimingTemplate::Paranoid),
            1 => Some(TimingTemplate::Sneaky),
            2 => Some(TimingTemplate::Polite),
            3 => Some(TimingTemplate::Normal),
            4 => Some(TimingTemplate::Aggressive),
            5 => Some(TimingTemplate::Insane),
            _ => None,
        }
    }

    pub fn flag(self) -> String {
        format!("-T{}", self.level())
    }

    pub fn description(self) -> &'static str {
        match self {
            TimingTemplate::Paranoid => "T0: Paranoid (IDS evasion, extremely slow)",
            TimingTemplate::Sneaky => "T1: Sneaky (IDS evasion, very slow)",
            TimingTemplate::Polite => "T2: Polite (less bandwidth, slower)",
            TimingTemplate::Normal => "T3: Normal (default timing)",
            TimingTemplate::Aggressive => "T4: Aggressive (fast, assumes good network)",
            TimingTemplate::Insane => "T5: Insane (extremely fast, may sacrifice accuracy)",
        }
    }
}

/// Where scan results end up. `Console` never produces a file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Console,
    Text,
    Json,
    Xml,
}

impl OutputFormat {
    /// nmap output flag for file formats; `None` for console-only.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            OutputFormat::Console => None,
            OutputFormat::Text => Some("-oN"),
            OutputFormat::Json => Some("-oJ"),
            OutputFormat::Xml => Some("-oX"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Console => "Console",
            OutputFormat::Text => "Text",
            OutputFormat::Json => "JSON",
            OutputFormat::Xml => "XML",
        };
        f.write_str(name)
    }
}

/// The single authoritative port selector of a scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PortSelection {
    #[default]
    Unset,
    /// `-p-`
    All,
    /// `-F`, nmap's top 100
    Fast,
    /// `--top-ports N`
    Top(u32),
    /// `-p a,b,c`. Held as `u32` so out-of-range input survives until validation.
    Explicit(Vec<u32>),
    /// `-p <spec>` passed through verbatim
    Range(String),
}

impl PortSelection {
    pub fn default_range() -> Self {
        PortSelection::Range(DEFAULT_PORT_RANGE.to_string())
    }

    /// An empty list or a blank range carries no selection.
    pub fn is_unset(&self) -> bool {
        match self {
            PortSelection::Unset => true,
            PortSelection::Explicit(ports) => ports.is_empty(),
            PortSelection::Range(spec) => spec.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TargetSpec {
    pub hosts: Vec<String>,
    /// Newline-delimited target file handed to nmap with `-iL`.
    pub input_file: Option<PathBuf>,
    pub exclusions: Vec<String>,
}

impl TargetSpec {
    pub fn add_target(&mut self, target: &str) {
        let target = target.trim();
        if !target.is_empty() {
            self.hosts.push(target.to_string());
        }
    }

    pub fn add_exclusion(&mut self, exclusion: &str) {
        let exclusion = exclusion.trim();
        if !exclusion.is_empty() {
            self.exclusions.push(exclusion.to_string());
        }
    }

    pub fn input_file(&self) -> Option<&PathBuf> {
        self.input_file
            .as_ref()
            .filter(|p| !p.to_string_lossy().trim().is_empty())
    }

    pub fn has_targets(&self) -> bool {
        !self.hosts.is_empty() || self.input_file().is_some()
    }
}

/// Everything needed to build one nmap command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ScanConfiguration {
    pub mode: ScanMode,
    pub targets: TargetSpec,
    pub ports: PortSelection,
    pub timing: TimingTemplate,
    pub output_file: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub verbose: bool,
    pub max_retries: Option<u32>,
    pub host_timeout_secs: Option<u64>,
    pub max_parallelism: Option<u32>,
}

/// A configuration that passed validation, together with the port selection
/// that will actually be emitted.
#[derive(Debug, Clone)]
pub struct Validated<'a> {
    pub config: &'a ScanConfiguration,
    pub ports: PortSelection,
}

impl ScanConfiguration {
    /// Check the invariants that must hold before translation.
    ///
    /// The configuration itself is never modified: when no port selector is
    /// present the default range appears only in the returned `Validated`.
    pub fn validate(&self) -> Result<Validated<'_>, ConfigError> {
        if !self.targets.has_targets() {
            return Err(ConfigError::NoTargets);
        }

        if let PortSelection::Explicit(ports) = &self.ports {
            if let Some(&port) = ports.iter().find(|p| !(1..=65535).contains(*p)) {
                return Err(ConfigError::PortOutOfRange { port });
            }
        }

        let ports = if self.ports.is_unset() {
            PortSelection::default_range()
        } else {
            self.ports.clone()
        };

        Ok(Validated { config: self, ports })
    }

    /// File the external tool is asked to write, if any.
    pub fn output_target(&self) -> Option<(&PathBuf, OutputFormat)> {
        match (&self.output_file, self.output_format) {
            (_, OutputFormat::Console) => None,
            (Some(path), format) if !path.as_os_str().is_empty() => Some((path, format)),
            _ => None,
        }
    }
}

/// A scan that has been started but not yet finalized.
///
/// Consuming `complete` or `fail` is the only way to obtain a `ScanResult`,
/// so each run is finalized exactly once.
#[derive(Debug)]
pub struct ScanRun {
    command: String,
    started_at: OffsetDateTime,
}

impl ScanRun {
    pub fn begin(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            started_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn complete(self, exit_code: Option<i32>, output: String, error_output: String) -> ScanResult {
        ScanResult {
            success: exit_code == Some(0),
            command: self.command,
            exit_code,
            output,
            error_output,
            started_at: self.started_at,
            finished_at: OffsetDateTime::now_utc(),
        }
    }

    /// Launch never happened: both timestamps collapse to the failure moment.
    pub fn fail(self, message: impl Into<String>) -> ScanResult {
        let now = OffsetDateTime::now_utc();
        ScanResult {
            success: false,
            command: self.command,
            exit_code: None,
            output: String::new(),
            error_output: message.into(),
            started_at: now,
            finished_at: now,
        }
    }
}

/// Outcome of one external tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub command: String,
    pub success: bool,
    /// `None` when the process never started or was killed by a signal.
    pub exit_code: Option<i32>,
    pub output: String,
    pub error_output: String,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
}

impl ScanResult {
    pub fn duration(&self) -> ::time::Duration {
        self.finished_at - self.started_at
    }
}
