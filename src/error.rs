use std::path::PathBuf;
use thiserror::Error;

use crate::types::OutputFormat;

/// Configuration problems caught by `ScanConfiguration::validate` before any
/// arguments are produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No targets specified")]
    NoTargets,

    #[error("Port numbers must be between 1 and 65535 (got {port})")]
    PortOutOfRange { port: u32 },
}

/// Failures while persisting a finished scan.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(OutputFormat),

    #[error("failed to write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
