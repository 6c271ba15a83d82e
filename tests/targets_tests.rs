use std::io::Write;

use nmap_wrap_rs::targets::{is_valid_target, load_targets_file};
use tempfile::NamedTempFile;

#[test]
fn import_skips_blank_and_comment_lines_and_drops_malformed() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "# lab hosts\n192.168.1.10\n\n10.0.0.0/24\nnot a target!\n  # indented comment\nweb-01.lab.local\n192.168.2.1-20"
    )
    .unwrap();

    let import = load_targets_file(file.path()).expect("load ok");
    assert_eq!(
        import.targets,
        vec!["192.168.1.10", "10.0.0.0/24", "web-01.lab.local", "192.168.2.1-20"]
    );
    assert_eq!(import.rejected, vec![(5, "not a target!".to_string())]);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_targets_file(dir.path().join("absent.txt")).unwrap_err();
    assert!(err.to_string().contains("absent.txt"));
}

#[test]
fn ipv6_cidr_is_valid() {
    assert!(is_valid_target("2001:db8::/32"));
}
