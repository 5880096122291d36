//! CLI-surface integration tests: invoke the built binary as a subprocess
//! and assert on its stdout/exit status, rather than calling library
//! functions directly (see tests/end_to_end.rs for those).

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn asa_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("asa.cfg");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "object network INSIDE_NET\n subnet 10.0.0.0 255.255.255.0\n nat (inside,outside) dynamic interface\naccess-list ACL extended permit ip object INSIDE_NET any"
    )
    .unwrap();
    path
}

#[test]
fn analyze_without_args_fails_with_usage() {
    let mut cmd = Command::cargo_bin("fw-migrate").unwrap();
    cmd.assert().failure();
}

#[test]
fn analyze_asa_input_prints_json_report_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = asa_fixture(dir.path());

    let mut cmd = Command::cargo_bin("fw-migrate").unwrap();
    cmd.args(["analyze", "--from", "asa", "--input"]).arg(&input);
    cmd.assert().success().stdout(predicate::str::contains("overall_score"));
}

#[test]
fn convert_asa_to_fortinet_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = asa_fixture(dir.path());
    let output = dir.path().join("fortinet.conf");

    let mut cmd = Command::cargo_bin("fw-migrate").unwrap();
    cmd.args(["convert", "--from", "asa", "--to", "fortinet", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output);
    cmd.assert().success();

    let generated = std::fs::read_to_string(&output).unwrap();
    assert!(generated.contains("config firewall policy"));
}

#[test]
fn convert_with_missing_input_file_fails() {
    let mut cmd = Command::cargo_bin("fw-migrate").unwrap();
    cmd.args(["convert", "--from", "asa", "--to", "fortinet", "--input", "/no/such/file.cfg"]);
    cmd.assert().failure().stderr(predicate::str::contains("reading"));
}

#[test]
fn convert_with_options_file_applies_interface_rename() {
    let dir = tempfile::tempdir().unwrap();
    let input = asa_fixture(dir.path());
    let options_path = dir.path().join("options.yaml");
    std::fs::write(&options_path, "interface_renames:\n  inside: trust\n").unwrap();

    let mut cmd = Command::cargo_bin("fw-migrate").unwrap();
    cmd.args(["convert", "--from", "asa", "--to", "fortinet", "--input"])
        .arg(&input)
        .arg("--options")
        .arg(&options_path);
    cmd.assert().success().stdout(predicate::str::contains("\"trust\""));
}
