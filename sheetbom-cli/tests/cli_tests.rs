//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the sheetbom binary (finds it in target/debug when run via cargo test).
fn sheetbom_cli() -> Command {
    cargo_bin_cmd!("sheetbom")
}

/// Path to a sheetbom library fixture project (relative to workspace).
fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("sheetbom")
        .join("tests")
        .join("fixtures")
        .join(name)
}

const TOP: &str = r#"(kicad_sch (version 20231120) (uuid "top-uuid")
  (symbol (lib_id "Device:R") (unit 1) (in_bom yes) (on_board yes) (uuid "r-top")
    (property "Reference" "R1") (property "Value" "1k") (property "Footprint" "R_0603")
    (instances (project "demo" (path "/top-uuid" (reference "R1") (unit 1)))))
  (sheet (at 0 0) (size 10 10) (uuid "io-sheet")
    (property "Sheetname" "IO") (property "Sheetfile" "io.kicad_sch")
    (instances (project "demo" (path "/top-uuid" (page "2"))))))"#;

const IO: &str = r#"(kicad_sch (version 20231120) (uuid "io-uuid")
  (global_label "SCL" (at 0 0 0) (uuid "scl-label"))
  (symbol (lib_id "Device:R") (unit 1) (in_bom yes) (on_board yes) (uuid "r-io")
    (property "Reference" "R2") (property "Value" "1k") (property "Footprint" "R_0603")
    (instances (project "demo" (path "/top-uuid/io-sheet" (reference "R2") (unit 1))))))"#;

fn small_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.kicad_sch"), TOP).unwrap();
    std::fs::write(dir.path().join("io.kicad_sch"), IO).unwrap();
    dir
}

#[test]
fn test_cli_help() {
    let mut cmd = sheetbom_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("KiCad"));
}

#[test]
fn test_cli_version() {
    let mut cmd = sheetbom_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_pages_human() {
    let mut cmd = sheetbom_cli();

    cmd.arg("pages").arg(fixture_dir("hierarchical"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Root"))
        .stdout(predicate::str::contains("Amp Left"))
        .stdout(predicate::str::contains("power.kicad_sch"));
}

#[test]
fn test_cli_pages_json_order() {
    let mut cmd = sheetbom_cli();

    cmd.arg("pages")
        .arg(fixture_dir("hierarchical"))
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON output");

    assert_eq!(json["hierarchy_resolved"], true);
    let numbers: Vec<_> = json["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page_number"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3", "10", ""]);
}

#[test]
fn test_cli_pages_flat_project() {
    let mut cmd = sheetbom_cli();

    cmd.arg("pages").arg(fixture_dir("flat"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No root sheet found"));
}

#[test]
fn test_cli_bom_json() {
    let mut cmd = sheetbom_cli();

    cmd.arg("bom")
        .arg(fixture_dir("hierarchical"))
        .arg("-f")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let rows: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON output");

    assert_eq!(rows.as_array().map(Vec::len), Some(9));
    assert_eq!(rows[1]["Reference"], "R1,\nR2,\nR4");
    assert_eq!(rows[1]["Qty"], 3);
}

#[test]
fn test_cli_bom_ungrouped_tempdir() {
    let dir = small_project();
    let mut cmd = sheetbom_cli();

    cmd.arg("bom").arg(dir.path()).arg("--ungrouped");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("R1"))
        .stdout(predicate::str::contains("R2"));
}

#[test]
fn test_cli_bom_board_only() {
    let mut cmd = sheetbom_cli();

    cmd.arg("bom").arg(fixture_dir("board_only"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("BOM from Board"))
        .stdout(predicate::str::contains("BSS138"));
}

#[test]
fn test_cli_find_label_and_designator() {
    let dir = small_project();

    let mut cmd = sheetbom_cli();
    cmd.arg("find").arg(dir.path()).arg("--label").arg("SCL");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("io.kicad_sch"))
        .stdout(predicate::str::contains("scl-label"));

    let mut cmd = sheetbom_cli();
    cmd.arg("find").arg(dir.path()).arg("--designator").arg("R2");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("io.kicad_sch"));
}

#[test]
fn test_cli_find_no_match_fails() {
    let dir = small_project();
    let mut cmd = sheetbom_cli();

    cmd.arg("find").arg(dir.path()).arg("--uuid").arg("missing");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No matches"));
}

#[test]
fn test_cli_find_requires_a_query() {
    let dir = small_project();
    let mut cmd = sheetbom_cli();

    cmd.arg("find").arg(dir.path());
    cmd.assert().failure();
}

#[test]
fn test_cli_broken_file_strict_and_lenient() {
    let dir = small_project();
    std::fs::write(dir.path().join("broken.kicad_sch"), "(kicad_sch (uuid").unwrap();

    let mut strict = sheetbom_cli();
    strict.arg("summary").arg(dir.path());
    strict
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.kicad_sch"));

    let mut lenient = sheetbom_cli();
    lenient.arg("summary").arg(dir.path()).arg("--lenient");
    lenient
        .assert()
        .success()
        .stdout(predicate::str::contains("Schematics: 2"));
}

#[test]
fn test_cli_summary_json() {
    let mut cmd = sheetbom_cli();

    cmd.arg("summary")
        .arg(fixture_dir("hierarchical"))
        .arg("--format")
        .arg("json")
        .arg("--jobs")
        .arg("2");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON output");

    assert_eq!(json["project_name"], "main");
    assert_eq!(json["bom_source"], "schematic");
}

#[test]
fn test_cli_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = sheetbom_cli();

    cmd.arg("pages").arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no KiCad schematics or boards"));
}

#[test]
fn test_cli_nonexistent_directory() {
    let mut cmd = sheetbom_cli();

    cmd.arg("bom").arg("/nonexistent/project/dir");
    cmd.assert().failure();
}
