use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::types::ScanMode;

/// Install hints shown when the scan binary cannot be found.
pub const INSTALL_HINT: &str = "Please install nmap:\n  \
    - Debian/Ubuntu: sudo apt-get install nmap\n  \
    - RHEL/CentOS: sudo yum install nmap\n  \
    - Arch: sudo pacman -S nmap\n  \
    - macOS: brew install nmap";

/// First line of `<program> --version`, or `None` if the program cannot be
/// run or exits unsuccessfully.
pub async fn binary_version(program: &str) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            debug!(program, error = %e, "version check failed");
        })
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Whether this process runs with an effective uid of 0.
pub async fn is_privileged() -> bool {
    match Command::new("id").arg("-u").stdin(Stdio::null()).output().await {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim() == "0",
        _ => false,
    }
}

/// Route through the escalation wrapper when forced, or when the scan mode
/// needs raw sockets and we are not already privileged.
pub fn needs_escalation(mode: ScanMode, privileged: bool, forced: bool) -> bool {
    forced || (mode.requires_privilege() && !privileged)
}
