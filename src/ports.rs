use crate::types::PortSelection;

/// Interpret the value given to `-p`.
///
/// - `80,443,8080` (only integers): `PortSelection::Explicit`, range checks are
///   left to validation so an out-of-range number is reported, not swallowed
/// - anything else (`1-1000`, `U:53,T:80`, `22,8000-8100`): `PortSelection::Range`
/// - blank input: `PortSelection::Unset`
pub fn parse_port_arg(value: &str) -> PortSelection {
    let value = value.trim();
    if value.is_empty() {
        return PortSelection::Unset;
    }

    let numbers: Option<Vec<u32>> = value
        .split(',')
        .map(|item| item.trim().parse::<u32>().ok())
        .collect();

    match numbers {
        Some(list) => PortSelection::Explicit(list),
        None => PortSelection::Range(value.to_string()),
    }
}

/// Comma-joined form used after `-p`.
pub fn join_ports(ports: &[u32]) -> String {
    ports
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_list_is_explicit() {
        assert_eq!(
            parse_port_arg("80, 443,8080"),
            PortSelection::Explicit(vec![80, 443, 8080])
        );
    }

    #[test]
    fn single_port_is_explicit() {
        assert_eq!(parse_port_arg("22"), PortSelection::Explicit(vec![22]));
    }

    #[test]
    fn ranges_and_protocol_prefixes_pass_through() {
        assert_eq!(parse_port_arg("1-1000"), PortSelection::Range("1-1000".into()));
        assert_eq!(
            parse_port_arg("22,8000-8100"),
            PortSelection::Range("22,8000-8100".into())
        );
        assert_eq!(
            parse_port_arg("U:53,T:80"),
            PortSelection::Range("U:53,T:80".into())
        );
    }

    #[test]
    fn out_of_range_numbers_survive_parsing() {
        assert_eq!(parse_port_arg("70000"), PortSelection::Explicit(vec![70000]));
    }

    #[test]
    fn blank_is_unset() {
        assert_eq!(parse_port_arg("  "), PortSelection::Unset);
    }

    #[test]
    fn join_keeps_order() {
        assert_eq!(join_ports(&[443, 22, 80]), "443,22,80");
    }
}
