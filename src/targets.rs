use anyhow::{Context, Result};
use ipnet::IpNet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Targets read from an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetImport {
    pub targets: Vec<String>,
    /// `(line number, text)` of lines that are not a recognizable target.
    pub rejected: Vec<(usize, String)>,
}

/// Whether `s` looks like something nmap accepts as a target: an IP address,
/// a CIDR block, a dotted IPv4 with a last-octet range (`10.0.0.1-50`) or a
/// hostname.
pub fn is_valid_target(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    s.parse::<IpAddr>().is_ok()
        || s.parse::<IpNet>().is_ok()
        || is_ipv4_octet_range(s)
        || is_valid_hostname(s)
}

/// `a.b.c.d` or `a.b.c.d-e` where every piece is 1-3 digits.
fn is_ipv4_octet_range(s: &str) -> bool {
    let Some((head, last)) = s.rsplit_once('.') else {
        return false;
    };
    let head: Vec<&str> = head.split('.').collect();
    if head.len() != 3 || !head.iter().all(|o| is_octet_digits(o)) {
        return false;
    }
    match last.split_once('-') {
        Some((a, b)) => is_octet_digits(a) && is_octet_digits(b),
        None => is_octet_digits(last),
    }
}

fn is_octet_digits(s: &str) -> bool {
    (1..=3).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// RFC 1123 labels: alphanumeric at both ends, hyphens inside, 1-63 chars.
fn is_valid_hostname(s: &str) -> bool {
    if s.len() > 253 {
        return false;
    }
    // All-numeric dotted names are malformed addresses, not hostnames.
    if s.split('.').all(|l| l.bytes().all(|b| b.is_ascii_digit())) && s.parse::<Ipv4Addr>().is_err() {
        return false;
    }
    s.split('.').all(|label| {
        let bytes = label.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 63
            && bytes[0].is_ascii_alphanumeric()
            && bytes[bytes.len() - 1].is_ascii_alphanumeric()
            && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
    })
}

/// Parse newline-delimited targets.
///
/// - blank lines and lines starting with `#` are skipped
/// - surrounding whitespace is trimmed
/// - lines that are not valid targets are collected in `rejected`
pub fn parse_targets_str(s: &str) -> TargetImport {
    let mut import = TargetImport::default();
    for (idx, raw_line) in s.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if is_valid_target(line) {
            import.targets.push(line.to_string());
        } else {
            import.rejected.push((idx + 1, line.to_string()));
        }
    }
    import
}

/// Load targets from a file. Errors only if the file cannot be read.
pub fn load_targets_file(path: impl AsRef<Path>) -> Result<TargetImport> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Target file not found: {}", path.as_ref().display()))?;
    Ok(parse_targets_str(&content))
}
